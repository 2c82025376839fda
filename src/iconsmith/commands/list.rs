use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::ArtifactStore;

pub fn run<S: ArtifactStore>(store: &S) -> Result<CmdResult> {
    let listing = store.list_artifacts()?;

    let mut result = CmdResult::default().with_listed_artifacts(listing.artifacts);
    for skipped in listing.skipped {
        result.add_message(CmdMessage::warning(format!(
            "Skipped {}: {}",
            skipped.path.display(),
            skipped.reason
        )));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;
    use crate::store::memory::InMemoryStore;
    use crate::test_utils::{TestEnv, sample_metadata};
    use std::fs;

    #[test]
    fn lists_most_recent_first() {
        let mut store = InMemoryStore::new();
        let mut first = sample_metadata("first", 1, false);
        first.created_at -= chrono::Duration::minutes(5);
        store.persist(b"1", first).unwrap();
        store
            .persist(b"2", sample_metadata("second", 1, true))
            .unwrap();

        let result = run(&store).unwrap();
        let descriptions: Vec<_> = result
            .listed_artifacts
            .iter()
            .map(|a| a.metadata.description.as_str())
            .collect();
        assert_eq!(descriptions, vec!["second", "first"]);
        assert!(result.messages.is_empty());
    }

    #[test]
    fn empty_store_lists_nothing() {
        let result = run(&InMemoryStore::new()).unwrap();
        assert!(result.listed_artifacts.is_empty());
        assert!(result.outcomes.is_empty());
    }

    #[test]
    fn unreadable_sidecars_become_warnings() {
        let mut env = TestEnv::new();
        env.store
            .persist(b"ok", sample_metadata("good", 1, false))
            .unwrap();
        fs::write(env.root.join("stray.png"), b"x").unwrap();

        let result = run(&env.store).unwrap();
        assert_eq!(result.listed_artifacts.len(), 1);
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].level, MessageLevel::Warning);
        assert!(result.messages[0].content.contains("stray.png"));
    }
}
