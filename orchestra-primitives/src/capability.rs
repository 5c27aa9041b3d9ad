//! The closed set of skills an agent may declare, plus the data-driven
//! task-type to capability implication table used by `can_handle`.

use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Display, Formatter};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A skill an agent may possess. Closed over the named variants, with
/// [`Capability::Custom`] as the documented extensibility escape hatch.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Coordinating other agents or subtasks.
    Orchestration,
    /// Observing system or task health.
    Monitoring,
    /// General-purpose analytical reasoning.
    Analysis,
    /// Improving behavior from past outcomes.
    Learning,
    /// Carrying out a concrete unit of work.
    Execution,
    /// Exchanging messages with other agents.
    Communication,
    /// Analysis specialized to natural-language text.
    TextAnalysis,
    /// Analysis specialized to source code.
    CodeAnalysis,
    /// Transforming or moving structured data.
    DataProcessing,
    /// An out-of-band capability not covered by the named variants.
    Custom(String),
}

impl Capability {
    /// Parses a capability from its wire token (kebab-case name, or an
    /// arbitrary token for [`Capability::Custom`]).
    ///
    /// # Errors
    ///
    /// Never fails: unrecognized tokens are accepted as [`Capability::Custom`].
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token {
            "orchestration" => Self::Orchestration,
            "monitoring" => Self::Monitoring,
            "analysis" => Self::Analysis,
            "learning" => Self::Learning,
            "execution" => Self::Execution,
            "communication" => Self::Communication,
            "text-analysis" => Self::TextAnalysis,
            "code-analysis" => Self::CodeAnalysis,
            "data-processing" => Self::DataProcessing,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Returns the wire token for this capability.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Orchestration => "orchestration",
            Self::Monitoring => "monitoring",
            Self::Analysis => "analysis",
            Self::Learning => "learning",
            Self::Execution => "execution",
            Self::Communication => "communication",
            Self::TextAnalysis => "text-analysis",
            Self::CodeAnalysis => "code-analysis",
            Self::DataProcessing => "data-processing",
            Self::Custom(token) => token,
        }
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared set of capabilities, e.g. what an agent advertises at
/// registration.
pub type CapabilitySet = BTreeSet<Capability>;

/// Looks up the capabilities implied by a task type, per the data-driven
/// implication table (not hard-coded dispatch per task type).
///
/// Unknown task types imply an empty set: callers fall back to requiring
/// an explicit capability requirement on the subtask in that case.
#[must_use]
pub fn implied_capabilities(task_type: &str) -> CapabilitySet {
    implication_table()
        .get(task_type)
        .cloned()
        .unwrap_or_default()
}

/// Returns whether `declared` satisfies everything `task_type` implies.
///
/// Per the contract this is a non-empty intersection, not a superset
/// requirement: an agent only needs to cover at least one of the implied
/// capabilities to be considered for the task.
#[must_use]
pub fn satisfies_task_type(declared: &CapabilitySet, task_type: &str) -> bool {
    let implied = implied_capabilities(task_type);
    if implied.is_empty() {
        return true;
    }
    declared.intersection(&implied).next().is_some()
}

fn implication_table() -> &'static HashMap<&'static str, CapabilitySet> {
    static TABLE: OnceLock<HashMap<&'static str, CapabilitySet>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table: HashMap<&'static str, CapabilitySet> = HashMap::new();
        table.insert("text_analysis", [Capability::TextAnalysis, Capability::Analysis].into());
        table.insert("compression", [Capability::Execution].into());
        table.insert("code_review", [Capability::CodeAnalysis, Capability::Analysis].into());
        table.insert("data_pipeline", [Capability::DataProcessing].into());
        table.insert("research_synthesis", [Capability::Analysis, Capability::Learning].into());
        table.insert("orchestration", [Capability::Orchestration].into());
        table.insert("monitoring", [Capability::Monitoring].into());
        table.insert("notify", [Capability::Communication].into());
        table
    })
}

/// Resolves a capability token to an [`Error`] when it is expected to be
/// one of the closed variants (used by strict config validation paths).
///
/// # Errors
///
/// Returns [`Error::UnknownCapability`] for any token that would parse as
/// [`Capability::Custom`].
pub fn require_known(token: &str) -> crate::Result<Capability> {
    let capability = Capability::parse(token);
    if matches!(capability, Capability::Custom(_)) {
        return Err(Error::UnknownCapability(token.to_string()));
    }
    Ok(capability)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_named_variants() {
        for token in [
            "orchestration",
            "monitoring",
            "analysis",
            "learning",
            "execution",
            "communication",
            "text-analysis",
            "code-analysis",
            "data-processing",
        ] {
            assert_eq!(Capability::parse(token).as_str(), token);
        }
    }

    #[test]
    fn unknown_token_becomes_custom() {
        let capability = Capability::parse("vision");
        assert_eq!(capability, Capability::Custom("vision".to_string()));
        assert!(require_known("vision").is_err());
    }

    #[test]
    fn text_analysis_implies_analysis_and_text_analysis() {
        let implied = implied_capabilities("text_analysis");
        assert!(implied.contains(&Capability::Analysis));
        assert!(implied.contains(&Capability::TextAnalysis));
    }

    #[test]
    fn satisfies_requires_only_non_empty_intersection() {
        let declared: CapabilitySet = [Capability::Analysis].into();
        assert!(satisfies_task_type(&declared, "text_analysis"));

        let declared: CapabilitySet = [Capability::Execution].into();
        assert!(!satisfies_task_type(&declared, "text_analysis"));
    }

    #[test]
    fn unknown_task_type_is_permissive() {
        let declared: CapabilitySet = [Capability::Execution].into();
        assert!(satisfies_task_type(&declared, "anything_unmapped"));
    }
}
