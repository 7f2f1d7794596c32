use anyhow::Result;
use quorate::storage::ReplStore;
use quorate::*;
use quorate_tests::*;
use serde_json::json;
use test_log::test;

const THREE: [&str; 3] = ["n1:27017", "n2:27017", "n3:27017"];
const FIVE: [&str; 5] = [
    "n1:27017", "n2:27017", "n3:27017", "n4:27017", "n5:27017",
];

#[test(tokio::test)]
async fn tolerates_one_down_of_three() -> Result<()> {
    let n = Node::running("n1:27017", &config("rs0", 1, &THREE)).await?;
    n.peer("n2:27017", Script::Reply(member_of("rs0", 1)));
    n.peer("n3:27017", Script::Unreachable);

    let accepted = n.node.reconfigure(config("rs0", 2, &THREE)).await?;
    assert_eq!(accepted.down, vec![h("n3:27017")]);
    Ok(())
}

#[test(tokio::test)]
async fn two_of_three_down() -> Result<()> {
    let n = Node::running("n1:27017", &config("rs0", 1, &THREE)).await?;
    n.peer("n2:27017", Script::Unreachable);
    n.peer("n3:27017", Script::Unreachable);

    let e = n
        .node
        .reconfigure(config("rs0", 2, &THREE))
        .await
        .unwrap_err();
    assert!(matches!(e, Error::Quorum(_)));
    assert_eq!(
        e.to_string(),
        "need most members up to reconfigure, not ok : n3:27017"
    );
    Ok(())
}

#[test(tokio::test)]
async fn tolerated_down_is_reported() -> Result<()> {
    // Four votes still allow only one missing.
    let hosts = ["n1:27017", "n2:27017", "n3:27017", "n4:27017"];
    let n = Node::running("n1:27017", &config("rs0", 1, &hosts)).await?;
    n.peer("n2:27017", Script::Reply(member_of("rs0", 1)));
    n.peer("n3:27017", Script::Reply(member_of("rs0", 1)));
    n.peer("n4:27017", Script::Unreachable);

    let accepted = n.node.reconfigure(config("rs0", 2, &hosts)).await?;
    assert_eq!(accepted.down, vec![h("n4:27017")]);
    assert_eq!(n.node.active_config().map(|c| c.version()), Some(2));
    assert_eq!(n.store.db().load_config().await?.map(|c| c.version()), Some(2));
    // Reconfiguration leaves the startup status alone.
    assert_eq!(n.node.startup_status(), StartupStatus::Started);
    Ok(())
}

#[test(tokio::test)]
async fn two_of_five_down() -> Result<()> {
    let n = Node::running("n1:27017", &config("rs0", 1, &FIVE)).await?;
    assert_eq!(quorum::allowable_failures(5), 2);
    n.peer("n2:27017", Script::Reply(member_of("rs0", 1)));
    n.peer("n3:27017", Script::Reply(member_of("rs0", 1)));
    n.peer("n4:27017", Script::Unreachable);
    n.peer("n5:27017", Script::Unreachable);

    let resp = n
        .node
        .replset_reconfig(&json!({
            "_id": "rs0",
            "version": 2,
            "members": [
                { "_id": 0, "host": "n1:27017" },
                { "_id": 1, "host": "n2:27017" },
                { "_id": 2, "host": "n3:27017" },
                { "_id": 3, "host": "n4:27017" },
                { "_id": 4, "host": "n5:27017" },
            ]
        }))
        .await;
    assert_eq!(
        resp.to_json(),
        json!({
            "ok": true,
            "info": "config version 2 saved",
            "down": ["n4:27017", "n5:27017"],
        })
    );
    Ok(())
}

#[test(tokio::test)]
async fn three_of_five_down() -> Result<()> {
    let n = Node::running("n1:27017", &config("rs0", 1, &FIVE)).await?;
    n.peer("n2:27017", Script::Reply(member_of("rs0", 1)));
    for host in &FIVE[2..] {
        n.peer(host, Script::Unreachable);
    }

    let e = n
        .node
        .reconfigure(config("rs0", 2, &FIVE))
        .await
        .unwrap_err();
    assert_eq!(e.code(), Some(13144));
    assert_eq!(n.node.active_config().map(|c| c.version()), Some(1));
    Ok(())
}

#[test(tokio::test)]
async fn weighted_votes() -> Result<()> {
    // Five votes over four members: a 2-vote member alone uses the whole allowance.
    let members = vec![
        MemberConfig::new(0, h("n1:27017")),
        MemberConfig::new(1, h("n2:27017")).with_votes(2),
        MemberConfig::new(2, h("n3:27017")),
        MemberConfig::new(3, h("n4:27017")),
    ];
    let current = GroupConfig::new("rs0", 1, members.clone())?;
    let n = Node::running("n1:27017", &current).await?;
    n.peer("n2:27017", Script::Unreachable);
    n.peer("n3:27017", Script::Reply(member_of("rs0", 1)));
    n.peer("n4:27017", Script::Reply(member_of("rs0", 1)));

    let accepted = n
        .node
        .reconfigure(GroupConfig::new("rs0", 2, members.clone())?)
        .await?;
    assert_eq!(accepted.down, vec![h("n2:27017")]);

    n.peer("n4:27017", Script::Unreachable);
    let e = n
        .node
        .reconfigure(GroupConfig::new("rs0", 3, members)?)
        .await
        .unwrap_err();
    assert!(matches!(e, Error::Quorum(_)));
    Ok(())
}

#[test(tokio::test)]
async fn member_reporting_in_group_is_not_down() -> Result<()> {
    let n = Node::running("n1:27017", &config("rs0", 1, &THREE)).await?;
    n.peer("n2:27017", Script::Reply(member_of("rs0", 1)));
    // Not ok, but still running as a member of the group.
    n.peer(
        "n3:27017",
        Script::Reply(quorate::probe::response::Heartbeat {
            ok: false,
            ..member_of("rs0", 1)
        }),
    );

    let accepted = n.node.reconfigure(config("rs0", 2, &THREE)).await?;
    assert!(accepted.down.is_empty());
    Ok(())
}

#[test(tokio::test)]
async fn peer_has_newer_config() -> Result<()> {
    let n = Node::running("n1:27017", &config("rs0", 1, &THREE)).await?;
    n.peer("n2:27017", Script::Reply(member_of("rs0", 1)));
    n.peer("n3:27017", Script::Reply(member_of("rs0", 2)));

    let e = n
        .node
        .reconfigure(config("rs0", 2, &THREE))
        .await
        .unwrap_err();
    assert_eq!(e.code(), Some(13341));
    assert!(matches!(
        e,
        Error::Version(VersionError::StaleProposal {
            theirs: 2,
            proposed: 2,
            ..
        })
    ));
    Ok(())
}

#[test(tokio::test)]
async fn new_member_can_be_added() -> Result<()> {
    let n = Node::running("n1:27017", &config("rs0", 1, &THREE)).await?;
    n.peer("n2:27017", Script::Reply(member_of("rs0", 1)));
    n.peer("n3:27017", Script::Reply(member_of("rs0", 1)));
    n.peer("n4:27017", Script::Reply(fresh()));

    let hosts = ["n1:27017", "n2:27017", "n3:27017", "n4:27017"];
    let accepted = n.node.reconfigure(config("rs0", 2, &hosts)).await?;
    assert_eq!(accepted.config.members().len(), 4);

    // Peers are not asked for emptiness on reconfiguration.
    assert!(n.transport.received().iter().all(|(_, check_empty)| !check_empty));
    Ok(())
}

#[test(tokio::test)]
async fn version_must_increase() -> Result<()> {
    let n = Node::running("n1:27017", &config("rs0", 3, &THREE)).await?;
    for v in [2, 3] {
        let e = n
            .node
            .reconfigure(config("rs0", v, &THREE))
            .await
            .unwrap_err();
        assert_eq!(
            e.to_string(),
            ConfigError::VersionNotIncreasing {
                current: 3,
                proposed: v
            }
            .to_string()
        );
    }
    assert!(n.transport.received().is_empty());
    Ok(())
}

#[test(tokio::test)]
async fn name_is_fixed() -> Result<()> {
    let n = Node::running("n1:27017", &config("rs0", 1, &THREE)).await?;
    let e = n
        .node
        .reconfigure(config("rs1", 2, &THREE))
        .await
        .unwrap_err();
    assert!(matches!(e, Error::Config(ConfigError::NameChanged { .. })));
    Ok(())
}

#[test(tokio::test)]
async fn member_host_is_fixed() -> Result<()> {
    let n = Node::running("n1:27017", &config("rs0", 1, &THREE)).await?;
    let e = n
        .node
        .reconfigure(config("rs0", 2, &["n1:27017", "n2:27017", "n9:27017"]))
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        Error::Config(ConfigError::HostChanged { id: 2, .. })
    ));
    Ok(())
}

#[test(tokio::test)]
async fn requires_active_group() -> Result<()> {
    let n = Node::new("n1:27017").await?;
    let e = n
        .node
        .reconfigure(config("rs0", 2, &THREE))
        .await
        .unwrap_err();
    assert!(matches!(e, Error::Precondition(PreconditionError::NotActive)));

    // Checked before the document is looked at.
    let resp = n.node.replset_reconfig(&json!({ "_id": "rs0", "members": [] })).await;
    assert!(!resp.ok);
    assert_eq!(resp.class.as_deref(), Some("PreconditionError"));
    assert_eq!(
        resp.errmsg.as_deref(),
        Some("no replica group is active on this node")
    );
    Ok(())
}

#[test(tokio::test)]
async fn document_is_required() -> Result<()> {
    let n = Node::running("n1:27017", &config("rs0", 1, &THREE)).await?;
    let resp = n.node.replset_reconfig(&json!("rs0")).await;
    assert!(!resp.ok);
    assert_eq!(resp.class.as_deref(), Some("ConfigError"));
    assert_eq!(resp.errmsg.as_deref(), Some("no config object was given"));
    Ok(())
}

#[test(tokio::test)]
async fn peer_with_version_but_no_group() -> Result<()> {
    let n = Node::running("n1:27017", &config("rs0", 1, &THREE)).await?;
    n.peer("n2:27017", Script::Reply(member_of("rs0", 1)));
    n.peer(
        "n3:27017",
        Script::Reply(quorate::probe::response::Heartbeat {
            config_version: Some(5),
            ..fresh()
        }),
    );

    let accepted = n.node.reconfigure(config("rs0", 2, &THREE)).await?;
    assert!(accepted.down.is_empty());
    Ok(())
}
