//! VersionResolver against a fake remote

use std::sync::Arc;

use pretty_assertions::assert_eq;
use rayext_core::{Error, PolicyDecider, VersionHint, VersionResolver};
use rayext_manifest::VersionRef;
use rayext_test_utils::{
    Answer, FakeRemote, Prompt, RemoteCall, ScriptedDecider, extension_zipball,
};
use rstest::rstest;

fn remote() -> Arc<FakeRemote> {
    Arc::new(
        FakeRemote::new()
            .with_tag("owner/demo", "v1.0", "t10", extension_zipball("demo", "Demo"))
            .with_tag("owner/demo", "v1.10", "t110", extension_zipball("demo", "Demo"))
            .with_tag("owner/demo", "v1.9", "t19", extension_zipball("demo", "Demo"))
            .with_branch("owner/demo", "main", "b1", extension_zipball("demo", "Demo"))
            .with_branch("owner/demo", "next", "b2", extension_zipball("demo", "Demo")),
    )
}

#[tokio::test]
async fn test_tags_are_fetched_once() {
    let remote = remote();
    let resolver = VersionResolver::new(remote.clone(), Arc::new(PolicyDecider::default()));

    let tags = resolver.tags("owner/demo").await.unwrap();
    resolver
        .pick_version("owner/demo", &VersionHint::default())
        .await
        .unwrap();

    let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["v1.10", "v1.9", "v1.0"]);
    assert_eq!(remote.count(|c| matches!(c, RemoteCall::Tags(_))), 1);
}

#[tokio::test]
async fn test_prompt_lists_tags_newest_first() {
    let remote = remote();
    let decider = Arc::new(ScriptedDecider::default());
    let resolver = VersionResolver::new(remote, decider.clone());

    let resolved = resolver
        .pick_version("owner/demo", &VersionHint::default())
        .await
        .unwrap();

    assert_eq!(resolved.version, VersionRef::Tag("v1.10".into()));
    assert_eq!(resolved.commit.unwrap().sha, "t110");
    assert_eq!(
        decider.prompts(),
        vec![Prompt::Select {
            message: "select a tag for owner/demo".into(),
            options: vec!["v1.10".into(), "v1.9".into(), "v1.0".into()],
            default: 0,
        }]
    );
}

#[rstest]
#[case::known("next", "next", "b2")]
#[case::unknown_falls_back_to_default("gone", "main", "b1")]
#[tokio::test]
async fn test_branch_hint_skips_tags(
    #[case] hint: &str,
    #[case] expected: &str,
    #[case] sha: &str,
) {
    let remote = remote();
    let resolver = VersionResolver::new(remote.clone(), Arc::new(PolicyDecider::default()));

    let resolved = resolver
        .pick_version("owner/demo", &VersionHint::branch(hint))
        .await
        .unwrap();

    assert_eq!(resolved.version, VersionRef::Branch(expected.into()));
    assert_eq!(resolved.commit.unwrap().sha, sha);
    assert_eq!(
        resolved.archive_url,
        format!("https://fake.test/repos/owner/demo/zipball/{expected}")
    );
    assert_eq!(remote.count(|c| matches!(c, RemoteCall::Tags(_))), 0);
}

#[tokio::test]
async fn test_known_branch_hint_is_not_offered_alternatives() {
    let decider = Arc::new(ScriptedDecider::new([]));
    let resolver = VersionResolver::new(remote(), decider.clone());

    let resolved = resolver
        .pick_version("owner/demo", &VersionHint::branch("next"))
        .await
        .unwrap();

    assert_eq!(resolved.version, VersionRef::Branch("next".into()));
    assert_eq!(decider.prompts(), vec![]);
}

#[tokio::test]
async fn test_unknown_branch_hint_prompts_with_default_preselected() {
    let remote = Arc::new(
        FakeRemote::new()
            .with_branch("owner/demo", "main", "b1", extension_zipball("demo", "Demo"))
            .with_branch("owner/demo", "next", "b2", extension_zipball("demo", "Demo"))
            .with_default_branch("owner/demo", "next"),
    );
    let decider = Arc::new(ScriptedDecider::new([]));
    let resolver = VersionResolver::new(remote, decider.clone());

    let resolved = resolver
        .pick_version("owner/demo", &VersionHint::branch("gone"))
        .await
        .unwrap();

    assert_eq!(resolved.version, VersionRef::Branch("next".into()));
    assert_eq!(
        decider.prompts(),
        vec![Prompt::Select {
            message: "select a branch for owner/demo".into(),
            options: vec!["main".into(), "next".into()],
            default: 1,
        }]
    );
}

#[tokio::test]
async fn test_cancelled_prompt_propagates() {
    let resolver = VersionResolver::new(
        remote(),
        Arc::new(ScriptedDecider::new([Answer::Cancel])),
    );

    let err = resolver
        .pick_version("owner/demo", &VersionHint::default())
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_unknown_repository_is_a_network_error() {
    let resolver = VersionResolver::new(remote(), Arc::new(PolicyDecider::default()));

    let err = resolver
        .pick_version("owner/missing", &VersionHint::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Network(rayext_github::Error::NotFound { .. })));
}
