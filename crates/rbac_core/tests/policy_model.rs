use rbac_core::{CreatePolicyCommand, Permission, Policy, PolicyDetail};
use uuid::Uuid;

fn sample_policy() -> Policy {
    Policy {
        id: 20,
        uid: Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap(),
        org_id: 1,
        name: "viewers".to_string(),
        description: "read-only".to_string(),
        created: 1_700_000_000_000,
        updated: 1_700_000_000_000,
    }
}

fn sample_permission() -> Permission {
    Permission {
        id: 3,
        policy_id: 20,
        org_id: 1,
        resource: "dashboards:*".to_string(),
        resource_type: "dashboards".to_string(),
        action: "dashboards:read".to_string(),
        created: 1_700_000_000_000,
        updated: 1_700_000_000_000,
    }
}

#[test]
fn policy_serialization_uses_expected_wire_fields() {
    let json = serde_json::to_value(sample_policy()).unwrap();

    assert_eq!(json["id"], 20);
    assert_eq!(json["uid"], "11111111-2222-4333-8444-555555555555");
    assert_eq!(json["org_id"], 1);
    assert_eq!(json["name"], "viewers");
    assert_eq!(json["created"], 1_700_000_000_000_i64);
}

#[test]
fn summary_omits_permissions_and_detail_includes_them() {
    let summary = PolicyDetail::summary(sample_policy());
    let json = serde_json::to_value(&summary).unwrap();
    assert!(json.get("permissions").is_none());

    let detail = PolicyDetail::with_permissions(sample_policy(), vec![sample_permission()]);
    let json = serde_json::to_value(&detail).unwrap();
    assert_eq!(json["permissions"][0]["resource_type"], "dashboards");
    assert_eq!(json["permissions"][0]["action"], "dashboards:read");

    let decoded: PolicyDetail = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, detail);
}

#[test]
fn create_policy_command_defaults_description() {
    let cmd: CreatePolicyCommand =
        serde_json::from_str(r#"{"org_id": 1, "name": "viewers"}"#).unwrap();
    assert_eq!(cmd.description, "");
}
