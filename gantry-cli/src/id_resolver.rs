//! ID resolver module
//!
//! Resolves short ID prefixes to full UUIDs by querying the API, so users can
//! type `gantry run get 5f0c` instead of the full run ID.

use anyhow::{Context, Result, anyhow};
use gantry_client::OrchestratorClient;
use uuid::Uuid;

use crate::types::IdOrPrefix;

/// Resolve a run ID or prefix to a full UUID
pub async fn resolve_run_id(client: &OrchestratorClient, id: &IdOrPrefix) -> Result<Uuid> {
    if let Some(uuid) = id.as_uuid() {
        return Ok(uuid);
    }

    let runs = client
        .list_runs()
        .await
        .context("Failed to fetch runs for ID resolution")?;

    pick_unique("run", id, runs.iter().map(|r| r.id))
}

/// Resolve an approval ID or prefix to a full UUID
pub async fn resolve_approval_id(client: &OrchestratorClient, id: &IdOrPrefix) -> Result<Uuid> {
    if let Some(uuid) = id.as_uuid() {
        return Ok(uuid);
    }

    let approvals = client
        .list_approvals(None)
        .await
        .context("Failed to fetch approvals for ID resolution")?;

    pick_unique("approval", id, approvals.iter().map(|a| a.id))
}

fn pick_unique(kind: &str, id: &IdOrPrefix, candidates: impl Iterator<Item = Uuid>) -> Result<Uuid> {
    let matches: Vec<Uuid> = candidates.filter(|c| id.matches(c)).collect();

    match matches.as_slice() {
        [] => Err(anyhow!("No {} found with ID starting with '{}'", kind, id)),
        [only] => Ok(*only),
        _ => {
            let ids: Vec<String> = matches.iter().map(Uuid::to_string).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple {}s: {}",
                id,
                kind,
                ids.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_unique() {
        let a = Uuid::parse_str("aaaa0000-0000-4000-8000-000000000001").unwrap();
        let b = Uuid::parse_str("aaab0000-0000-4000-8000-000000000002").unwrap();

        let found = pick_unique("run", &IdOrPrefix::parse("aaab"), [a, b].into_iter()).unwrap();
        assert_eq!(found, b);

        let err = pick_unique("run", &IdOrPrefix::parse("aaa"), [a, b].into_iter()).unwrap_err();
        assert!(err.to_string().contains("Ambiguous prefix"));

        let err = pick_unique("run", &IdOrPrefix::parse("f"), [a, b].into_iter()).unwrap_err();
        assert!(err.to_string().contains("No run found"));
    }
}
