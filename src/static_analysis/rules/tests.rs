use super::{
    backup::{adb_backup, auto_backup, backup_agent, backup_rules, AutoBackup, RulesAttribute},
    cleartext::{cleartext_traffic, Cleartext},
    components::{exported_components, intent_filters, is_exported, unexported_providers_with_grant},
    info::{app_info, debuggable, mismatch_mask, sdk_mismatch, uses_entries, UsesKind},
    links::{app_links, deep_links, AssetLinkStatus, AssetLinkVerifier, NoVerification},
    network::{
        network_security_config_file, nsc_cleartext, pinning, trust_anchors, BaseAnchors,
        DefaultTrustAnchors,
    },
    permissions::{
        builtin_permissions, custom_permissions, is_dangerous, permission_usage, UsageIssue,
    },
};
use crate::{
    policy::{PolicyOutcome, SdkRange},
    static_analysis::{
        manifest::{
            Component, ComponentKind, CustomPermission, IntentData, IntentFilter, Manifest,
            ProtectionLevel, ResourceRef, TriBool, UsesEntry, UsesSdk, ACTION_VIEW,
            CATEGORY_BROWSABLE,
        },
        network_security::{
            BaseConfig, Certificate, Domain, DomainConfig, NetworkSecurityConfig, PinSet,
        },
    },
};
use chrono::NaiveDate;
use std::cell::RefCell;

fn range(min: u32, target: u32, max: u32) -> SdkRange {
    SdkRange::new(min, Some(target), max).unwrap()
}

fn tribool(value: Option<bool>) -> TriBool {
    value.map(TriBool::from).unwrap_or_default()
}

fn split<T>(trigger: u32, below: PolicyOutcome<T>, above: PolicyOutcome<T>) -> PolicyOutcome<T> {
    PolicyOutcome::split(trigger, below, above)
}

fn single<T>(value: T) -> PolicyOutcome<T> {
    PolicyOutcome::Single(value)
}

fn deep_link_filter(scheme: &str, host: &str) -> IntentFilter {
    IntentFilter::default()
        .with_action(ACTION_VIEW)
        .with_category(CATEGORY_BROWSABLE)
        .with_data(IntentData {
            scheme: Some(scheme.to_owned()),
            host: Some(host.to_owned()),
            ..IntentData::default()
        })
}

fn certificate(src: &str, override_pins: bool) -> Certificate {
    Certificate {
        src: src.to_owned(),
        override_pins,
    }
}

fn domain_config(domain: &str) -> DomainConfig {
    DomainConfig {
        domains: vec![Domain {
            name: domain.to_owned(),
            include_subdomains: false,
        }],
        ..DomainConfig::default()
    }
}

#[test]
fn it_adb_backup_scenarios() {
    let mut manifest = Manifest::default();
    manifest.application_mut().allow_backup = TriBool::True;
    manifest.application_mut().debuggable = TriBool::False;

    assert_eq!(
        adb_backup(&manifest, &range(30, 31, 31)),
        split(31, single(true), single(false))
    );
    assert_eq!(adb_backup(&manifest, &range(31, 31, 32)), single(false));

    manifest.application_mut().allow_backup = TriBool::False;
    for &debug in &[TriBool::True, TriBool::False, TriBool::Unset] {
        manifest.application_mut().debuggable = debug;
        assert_eq!(adb_backup(&manifest, &range(15, 25, 33)), single(false));
        assert_eq!(adb_backup(&manifest, &range(30, 31, 31)), single(false));
    }
}

#[test]
fn it_adb_backup_table() {
    // allowBackup, debuggable, API level, expected.
    let cases = [
        (Some(true), Some(true), 25, true),
        (Some(true), Some(true), 31, true),
        (Some(true), Some(false), 30, true),
        (Some(true), Some(false), 31, false),
        (Some(true), Some(false), 32, false),
        (Some(false), Some(true), 25, false),
        (Some(false), Some(true), 32, false),
        (None, Some(true), 32, true),
        (None, Some(false), 30, true),
        (None, Some(false), 31, false),
        (None, None, 25, true),
        (None, None, 31, false),
        (Some(true), None, 30, true),
        (Some(true), None, 32, false),
        (Some(false), None, 25, false),
    ];

    for &(allow_backup, debug, api, expected) in &cases {
        let mut manifest = Manifest::default();
        manifest.application_mut().allow_backup = tribool(allow_backup);
        manifest.application_mut().debuggable = tribool(debug);

        assert_eq!(
            adb_backup(&manifest, &SdkRange::single(api)),
            single(expected),
            "allowBackup={:?}, debuggable={:?}, API {}",
            allow_backup,
            debug,
            api
        );
    }
}

#[test]
fn it_auto_backup_nested() {
    let mut manifest = Manifest::default();
    manifest.application_mut().allow_backup = TriBool::True;
    manifest.application_mut().full_backup_only = TriBool::True;

    let outcome = auto_backup(&manifest, &range(20, 27, 28));
    assert_eq!(
        outcome,
        split(
            23,
            single(AutoBackup::Inactive),
            split(28, single(AutoBackup::Unencrypted), single(AutoBackup::Encrypted))
        )
    );
    assert_eq!(
        outcome.intervals(20, 28),
        vec![
            (20, 22, &AutoBackup::Inactive),
            (23, 27, &AutoBackup::Unencrypted),
            (28, 28, &AutoBackup::Encrypted),
        ]
    );
}

#[test]
fn it_auto_backup_table() {
    use self::AutoBackup::*;

    let unencrypted_then_encrypted = || split(28, single(Unencrypted), single(Encrypted));
    // min, target, max, expected when Auto Backup is opted in.
    let cases = vec![
        (12, 20, 20, single(Inactive)),
        (12, 22, 22, single(Inactive)),
        (12, 23, 23, split(23, single(Inactive), single(Unencrypted))),
        (23, 26, 26, single(Unencrypted)),
        (
            20,
            27,
            28,
            split(23, single(Inactive), unencrypted_then_encrypted()),
        ),
        (23, 26, 27, single(Unencrypted)),
        (23, 26, 28, unencrypted_then_encrypted()),
        (25, 28, 28, unencrypted_then_encrypted()),
        (28, 30, 30, single(Encrypted)),
    ];

    // allowBackup, fullBackupOnly, has a backup agent, opted in.
    let attributes = [
        (Some(true), Some(true), false, true),
        (Some(true), Some(false), false, true),
        (Some(true), None, false, true),
        (None, None, false, true),
        (Some(true), Some(true), true, true),
        (Some(true), Some(false), true, false),
        (Some(true), None, true, false),
        (Some(false), Some(true), false, false),
        (Some(false), None, false, false),
        (Some(false), Some(true), true, false),
    ];

    for (min, target, max, expected) in cases {
        for &(allow_backup, full_backup_only, agent, opted_in) in &attributes {
            let mut manifest = Manifest::default();
            let application = manifest.application_mut();
            application.allow_backup = tribool(allow_backup);
            application.full_backup_only = tribool(full_backup_only);
            application.backup_agent = if agent {
                Some("com.example.BackupAgent".to_owned())
            } else {
                None
            };

            let expected = if opted_in {
                expected.clone()
            } else {
                single(Inactive)
            };
            assert_eq!(
                auto_backup(&manifest, &range(min, target, max)),
                expected,
                "allowBackup={:?}, fullBackupOnly={:?}, agent={}, range {}/{}/{}",
                allow_backup,
                full_backup_only,
                agent,
                min,
                target,
                max
            );
        }
    }
}

#[test]
fn it_backup_agent() {
    let mut manifest = Manifest::default();
    assert_eq!(backup_agent(&manifest), None);

    manifest.application_mut().backup_agent = Some(".MyBackupAgent".to_owned());
    assert_eq!(backup_agent(&manifest).as_deref(), Some(".MyBackupAgent"));
}

#[test]
fn it_backup_rules_coverage() {
    let file = || Some(ResourceRef::resolve("@xml/backup_rules"));
    // fullBackupContent, dataExtractionRules, min, target, coverage.
    let cases = vec![
        (file(), file(), 15, 30, 1),
        (file(), file(), 15, 31, 3),
        (file(), file(), 31, 32, 2),
        (file(), file(), 30, 31, 3),
        (None, file(), 15, 30, 0),
        (None, file(), 31, 32, 2),
        (None, file(), 17, 31, 2),
        (file(), None, 15, 30, 1),
        (file(), None, 31, 32, 0),
        (file(), None, 17, 31, 1),
        (None, None, 15, 30, 0),
        (None, None, 15, 31, 0),
        (None, None, 31, 32, 0),
    ];

    for (full_backup_content, data_extraction_rules, min, target, coverage) in cases {
        let mut manifest = Manifest::default();
        manifest.application_mut().full_backup_content = full_backup_content.clone();
        manifest.application_mut().data_extraction_rules = data_extraction_rules.clone();

        let rules = backup_rules(&manifest, &range(min, target, 33));
        assert_eq!(
            rules.coverage, coverage,
            "fullBackupContent={:?}, dataExtractionRules={:?}, min {}, target {}",
            full_backup_content, data_extraction_rules, min, target
        );
    }
}

#[test]
fn it_backup_rules_compiled_references() {
    // Numeric references of compiled manifests, even when the resource table is not available.
    let mut manifest = Manifest::default();
    manifest.application_mut().full_backup_content = Some(ResourceRef::resolve("@0x7f130001"));
    manifest.application_mut().data_extraction_rules = Some(ResourceRef::resolve("@0x7f130002"));

    let rules = backup_rules(&manifest, &range(21, 33, 33));
    assert_eq!(rules.coverage, 3);
    let values = rules.outcome.values();
    assert_eq!(values[0].file.as_ref().and_then(ResourceRef::id), Some(0x7f13_0001));
}

#[test]
fn it_backup_rules_outcome() {
    let mut manifest = Manifest::default();
    manifest.application_mut().full_backup_content = Some(ResourceRef::resolve("@xml/old"));
    manifest.application_mut().data_extraction_rules = Some(ResourceRef::resolve("false"));

    let rules = backup_rules(&manifest, &range(26, 31, 33));
    let values = rules.outcome.values();
    assert_eq!(values.len(), 2);
    assert_eq!(values[0].attribute, RulesAttribute::FullBackupContent);
    assert_eq!(values[0].file.as_ref().and_then(|f| f.file()), Some("res/xml/old.xml"));
    assert_eq!(values[1].attribute, RulesAttribute::DataExtractionRules);
    // Literal values are not rules files.
    assert!(values[1].file.is_none());
    assert_eq!(rules.coverage, 1);
}

#[test]
fn it_cleartext_default_flip() {
    let manifest = Manifest::default();
    assert_eq!(
        cleartext_traffic(&manifest, &range(20, 27, 27)),
        single(Cleartext::Permitted)
    );
    assert_eq!(
        cleartext_traffic(&manifest, &range(20, 28, 28)),
        single(Cleartext::Forbidden)
    );
}

#[test]
fn it_cleartext_table() {
    use self::Cleartext::*;

    let deferred = || single(DeferredToNetworkSecurityConfig);
    let then_deferred = |value: Cleartext| {
        split(24, single(value), single(DeferredToNetworkSecurityConfig))
    };
    // usesCleartextTraffic, min, max, target, network security config, expected.
    let cases = vec![
        (Some(true), 20, 21, 21, false, single(Permitted)),
        (Some(true), 20, 21, 21, true, single(Permitted)),
        (Some(false), 20, 21, 21, true, single(Forbidden)),
        (None, 20, 21, 21, false, single(Permitted)),
        (None, 20, 21, 21, true, single(Permitted)),
        (Some(true), 20, 24, 24, true, then_deferred(Permitted)),
        (Some(false), 20, 24, 24, true, then_deferred(Forbidden)),
        (None, 20, 24, 24, false, single(Permitted)),
        (None, 20, 24, 24, true, then_deferred(Permitted)),
        (None, 20, 28, 27, true, then_deferred(Permitted)),
        (None, 20, 32, 30, false, single(Forbidden)),
        (None, 20, 32, 30, true, then_deferred(Forbidden)),
        (Some(true), 20, 32, 30, false, single(Permitted)),
        (Some(false), 23, 25, 24, true, then_deferred(Forbidden)),
        (Some(true), 24, 25, 25, true, deferred()),
        (None, 24, 25, 25, false, single(Permitted)),
        (None, 27, 28, 28, false, single(Forbidden)),
        (None, 27, 28, 28, true, deferred()),
        (Some(false), 28, 33, 30, true, deferred()),
        (None, 28, 33, 30, false, single(Forbidden)),
    ];

    for (declared, min, max, target, nsc, expected) in cases {
        let mut manifest = Manifest::default();
        manifest.application_mut().uses_cleartext_traffic = tribool(declared);
        if nsc {
            manifest.application_mut().network_security_config =
                Some(ResourceRef::resolve("@xml/network_security_config"));
        }

        assert_eq!(
            cleartext_traffic(&manifest, &range(min, target, max)),
            expected,
            "usesCleartextTraffic={:?}, range {}/{}/{}, network security config: {}",
            declared,
            min,
            target,
            max,
            nsc
        );
    }
}

#[test]
fn it_exported_resolution() {
    let mut activity = Component::new(ComponentKind::Activity, ".Main");
    assert!(!is_exported(&activity, &range(21, 30, 33)));
    activity.add_intent_filter(IntentFilter::default().with_action("android.intent.action.MAIN"));
    assert!(is_exported(&activity, &range(21, 30, 33)));
    activity.set_exported(TriBool::False);
    assert!(!is_exported(&activity, &range(21, 30, 33)));

    let mut provider = Component::new(ComponentKind::Provider, ".Data");
    assert!(is_exported(&provider, &range(16, 30, 33)));
    assert!(!is_exported(&provider, &range(17, 30, 33)));
    provider.set_exported(TriBool::True);
    assert!(is_exported(&provider, &range(17, 30, 33)));
}

#[test]
fn it_exported_components() {
    // kind, permission, readPermission, writePermission, unprotected.
    let cases = [
        (ComponentKind::Activity, Some("perm"), None, None, false),
        (ComponentKind::Service, Some("perm"), None, None, false),
        (ComponentKind::Receiver, Some("perm"), None, None, false),
        (ComponentKind::Activity, None, None, None, true),
        (ComponentKind::Service, None, None, None, true),
        (ComponentKind::Receiver, None, None, None, true),
        (ComponentKind::Activity, None, Some("perm"), None, true),
        (ComponentKind::Provider, None, None, None, true),
        (ComponentKind::Provider, Some("perm"), None, None, false),
        (ComponentKind::Provider, None, Some("perm"), None, false),
        (ComponentKind::Provider, None, None, Some("perm"), false),
    ];

    for &(kind, permission, read, write, unprotected) in &cases {
        let mut component = Component::new(kind, "com.example.Component");
        component.set_exported(TriBool::True);
        if let Some(p) = permission {
            component.set_permission(p);
        }
        if let Some(p) = read {
            component.set_read_permission(p);
        }
        if let Some(p) = write {
            component.set_write_permission(p);
        }
        let mut manifest = Manifest::default();
        manifest.add_component(component);

        let exported = exported_components(&manifest, &range(21, 30, 33));
        assert_eq!(exported.len(), 1);
        assert_eq!(
            exported[0].unprotected, unprotected,
            "{} with permission={:?}, read={:?}, write={:?}",
            kind, permission, read, write
        );
    }
}

#[test]
fn it_exported_components_skip_links() {
    let mut manifest = Manifest::default();
    let mut link = Component::new(ComponentKind::Activity, ".LinkActivity");
    link.add_intent_filter(deep_link_filter("https", "example.com"));
    manifest.add_component(link);
    let mut hidden = Component::new(ComponentKind::Service, ".Hidden");
    hidden.set_exported(TriBool::False);
    manifest.add_component(hidden);

    assert!(exported_components(&manifest, &range(21, 30, 33)).is_empty());

    let filters = intent_filters(&manifest, &range(21, 30, 33));
    assert_eq!(filters.len(), 1);
    assert_eq!(filters[0].component, ".LinkActivity");
    assert_eq!(filters[0].uris, vec!["https://example.com".to_owned()]);
}

#[test]
fn it_unexported_providers_with_grant() {
    let mut manifest = Manifest::default();
    let mut granting = Component::new(ComponentKind::Provider, ".Files");
    granting.set_exported(TriBool::False);
    granting.set_grant_uri_permissions(TriBool::True);
    manifest.add_component(granting);
    let mut exported = Component::new(ComponentKind::Provider, ".Public");
    exported.set_exported(TriBool::True);
    exported.set_grant_uri_permissions(TriBool::True);
    manifest.add_component(exported);
    let mut default = Component::new(ComponentKind::Provider, ".Default");
    default.set_grant_uri_permissions(TriBool::True);
    manifest.add_component(default);

    assert_eq!(
        unexported_providers_with_grant(&manifest, &range(21, 30, 33)),
        vec![".Files".to_owned(), ".Default".to_owned()]
    );
    // Providers are exported by default up to Android 4.1.
    assert_eq!(
        unexported_providers_with_grant(&manifest, &range(15, 30, 33)),
        vec![".Files".to_owned()]
    );
}

struct RecordingVerifier {
    hosts: RefCell<Vec<String>>,
}

impl AssetLinkVerifier for RecordingVerifier {
    fn verify(&self, host: &str) -> AssetLinkStatus {
        self.hosts.borrow_mut().push(host.to_owned());
        if host == "example.com" {
            AssetLinkStatus::Published
        } else {
            AssetLinkStatus::Missing
        }
    }
}

#[test]
fn it_deep_links() {
    let mut manifest = Manifest::default();
    assert!(deep_links(&manifest).is_empty());

    let mut activity = Component::new(ComponentKind::Activity, ".Link");
    activity.add_intent_filter(deep_link_filter("myapp", "open"));
    // Not browsable.
    activity.add_intent_filter(
        IntentFilter::default()
            .with_action(ACTION_VIEW)
            .with_data(IntentData {
                scheme: Some("https".to_owned()),
                ..IntentData::default()
            }),
    );
    manifest.add_component(activity);

    let links = deep_links(&manifest);
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].uris, vec!["myapp://open".to_owned()]);
    assert!(!links[0].auto_verify);
}

#[test]
fn it_app_links_count_hosts() {
    // autoVerify of each deep link filter, host, expected distinct verified hosts.
    let cases: Vec<(Vec<(Option<bool>, &str)>, usize)> = vec![
        (vec![(None, "host")], 0),
        (vec![], 0),
        (vec![(Some(true), "host")], 1),
        (vec![(Some(true), "host"), (None, "host")], 1),
        (vec![(Some(true), "host"), (Some(false), "other")], 1),
        (vec![(Some(true), "host"), (Some(true), "other")], 2),
        (vec![(Some(true), "host"), (Some(true), "host")], 1),
    ];

    for (filters, expected) in cases {
        let mut component = Component::new(ComponentKind::Activity, ".Link");
        for &(auto_verify, host) in &filters {
            component.add_intent_filter(
                deep_link_filter("https", host).with_auto_verify(tribool(auto_verify)),
            );
        }
        let mut manifest = Manifest::default();
        manifest.add_component(component);

        let links = app_links(&manifest, &NoVerification);
        assert_eq!(links.len(), expected, "{:?}", filters);
        assert!(links.iter().all(|l| l.status == AssetLinkStatus::NotChecked));
    }
}

#[test]
fn it_app_links_verification() {
    let mut component = Component::new(ComponentKind::Activity, ".Link");
    component.add_intent_filter(
        deep_link_filter("https", "*.example.com").with_auto_verify(TriBool::True),
    );
    component.add_intent_filter(
        deep_link_filter("https", "shop.example.org").with_auto_verify(TriBool::True),
    );
    let mut manifest = Manifest::default();
    manifest.add_component(component);

    let verifier = RecordingVerifier {
        hosts: RefCell::new(Vec::new()),
    };
    let links = app_links(&manifest, &verifier);

    assert_eq!(
        *verifier.hosts.borrow(),
        vec!["example.com".to_owned(), "shop.example.org".to_owned()]
    );
    assert_eq!(links[0].host, "*.example.com");
    assert_eq!(links[0].status, AssetLinkStatus::Published);
    assert_eq!(links[1].status, AssetLinkStatus::Missing);
}

#[test]
fn it_permission_hygiene() {
    let mut manifest = Manifest::default();
    manifest.add_permission(CustomPermission::new(
        "com.app.PERM_X",
        ProtectionLevel::Signature,
    ));
    let mut receiver = Component::new(ComponentKind::Receiver, ".Receiver");
    receiver.set_uses_permission_attribute("com.app.PERM_X");
    manifest.add_component(receiver);

    let findings = permission_usage(&manifest);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].permission, "com.app.PERM_X");
    assert_eq!(findings[0].issue, UsageIssue::WrongAttribute);
    assert_eq!(findings[0].component.as_deref(), Some(".Receiver"));
}

#[test]
fn it_permission_usage() {
    let mut manifest = Manifest::default();
    manifest.add_permission(CustomPermission::new("com.app.UNUSED", ProtectionLevel::Normal));
    manifest.add_permission(CustomPermission::new("com.app.USED", ProtectionLevel::Signature));
    manifest.add_permission(CustomPermission::new(
        "com.app.APPLICATION",
        ProtectionLevel::Signature,
    ));
    manifest.application_mut().permission = Some("com.app.APPLICATION".to_owned());

    let mut service = Component::new(ComponentKind::Service, ".Sync");
    service.set_permission("com.app.USED");
    manifest.add_component(service);
    let mut provider = Component::new(ComponentKind::Provider, ".Data");
    provider.set_read_permission("com.other.READ");
    provider.set_write_permission("android.permission.WRITE_SETTINGS");
    manifest.add_component(provider);
    let mut other = Component::new(ComponentKind::Activity, ".Other");
    other.set_permission("com.other.READ");
    manifest.add_component(other);

    let findings = permission_usage(&manifest);
    assert_eq!(findings.len(), 2);
    assert_eq!(findings[0].permission, "com.app.UNUSED");
    assert_eq!(findings[0].issue, UsageIssue::DeclaredNotUsed);
    assert_eq!(findings[1].permission, "com.other.READ");
    assert_eq!(findings[1].issue, UsageIssue::UsedNotDeclared);
    assert_eq!(findings[1].component.as_deref(), Some(".Data"));
}

#[test]
fn it_custom_permissions() {
    let mut manifest = Manifest::default();
    manifest.add_permission(CustomPermission::new("a", ProtectionLevel::Normal));
    manifest.add_permission(CustomPermission::new("b", ProtectionLevel::Dangerous));
    manifest.add_permission(CustomPermission::new("c", ProtectionLevel::Signature));
    manifest.add_permission(CustomPermission::new(
        "d",
        ProtectionLevel::Other("unknown".to_owned()),
    ));

    let reachable: Vec<bool> = custom_permissions(&manifest)
        .iter()
        .map(|p| p.attacker_reachable)
        .collect();
    assert_eq!(reachable, vec![true, true, false, false]);
}

#[test]
fn it_builtin_permissions() {
    let mut manifest = Manifest::default();
    manifest.add_uses_permission("android.permission.INTERNET");
    manifest.add_uses_permission("android.permission.CAMERA");
    manifest.add_uses_permission("android.permission.READ_SMS");

    let permissions = builtin_permissions(&manifest);
    assert_eq!(permissions.iter().filter(|p| p.dangerous).count(), 2);
    assert!(!permissions[0].dangerous);
    assert!(is_dangerous("android.permission.ACCESS_FINE_LOCATION"));
    assert!(!is_dangerous("com.app.CAMERA"));
}

#[test]
fn it_sdk_mismatch_mask() {
    let sdk = |min, target, max| UsesSdk {
        min: Some(min),
        target: Some(target),
        max: Some(max),
    };
    // Declared min/target/max, analyzed min/target/max, mask.
    let cases = [
        (sdk(15, 20, 30), (15, 20, 30), 0),
        (sdk(15, 20, 30), (20, 20, 30), 1),
        (sdk(15, 20, 30), (20, 20, 31), 3),
        (sdk(15, 20, 30), (15, 20, 31), 2),
        (sdk(15, 20, 30), (1, 20, 30), 1),
        (sdk(15, 20, 30), (1, 20, 31), 3),
        (sdk(0, 0, 0), (15, 15, 30), 0),
        (sdk(1, 0, 0), (15, 15, 30), 1),
        (sdk(0, 0, 4), (15, 15, 30), 2),
        (sdk(13, 0, 4), (15, 15, 30), 3),
        (sdk(15, 0, 0), (15, 15, 30), 0),
        (sdk(0, 0, 30), (15, 15, 30), 0),
        (sdk(1, 0, 30), (15, 15, 30), 1),
        (sdk(15, 20, 30), (15, 16, 30), 4),
        (sdk(15, 20, 30), (11, 16, 30), 5),
        (sdk(15, 20, 30), (11, 16, 31), 7),
        (sdk(1, 1, 30), (15, 16, 30), 5),
        (sdk(0, 1, 0), (15, 16, 30), 4),
        (UsesSdk::default(), (15, 16, 30), 0),
    ];

    for &(declared, (min, target, max), mask) in &cases {
        assert_eq!(
            mismatch_mask(declared, min, target, max),
            mask,
            "declared {:?}, analyzed {}/{}/{}",
            declared,
            min,
            target,
            max
        );
    }

    let mut manifest = Manifest::default();
    manifest.set_uses_sdk(sdk(21, 30, 0));
    let mismatch = sdk_mismatch(&manifest, &range(21, 33, 34));
    assert_eq!(mismatch.mask, 4);
    assert!(!mismatch.declares_max());
}

#[test]
fn it_app_info() {
    let mut manifest = Manifest::default();
    manifest.set_package("com.example.app");
    let mut main = Component::new(ComponentKind::Activity, ".Main");
    main.set_exported(TriBool::True);
    manifest.add_component(main);
    manifest.add_component(Component::new(ComponentKind::ActivityAlias, ".Alias"));
    manifest.add_component(Component::new(ComponentKind::Provider, ".Data"));

    let info = app_info(&manifest, &range(21, 30, 33));
    assert_eq!(info.package, "com.example.app");
    assert_eq!(info.components[0].kind, ComponentKind::Activity);
    assert_eq!(info.components[0].total, 2);
    assert_eq!(info.components[0].exported, 1);
    assert_eq!(info.components[2].kind, ComponentKind::Provider);
    assert_eq!(info.components[2].exported, 0);
}

#[test]
fn it_uses_entries_and_debuggable() {
    let mut manifest = Manifest::default();
    manifest.add_uses_library(UsesEntry::new("org.apache.http.legacy", TriBool::Unset));
    manifest.add_uses_native_library(UsesEntry::new("libOpenCL.so", TriBool::False));
    manifest.add_uses_feature(UsesEntry::new("android.hardware.camera", TriBool::True));

    let entries = uses_entries(&manifest);
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].kind, UsesKind::Library);
    assert!(entries[0].required);
    assert_eq!(entries[1].kind, UsesKind::NativeLibrary);
    assert!(!entries[1].required);
    assert!(entries[2].required);

    // debuggable, expected.
    for &(declared, expected) in &[(Some(true), true), (Some(false), false), (None, false)] {
        manifest.application_mut().debuggable = tribool(declared);
        assert_eq!(debuggable(&manifest), expected);
    }
}

#[test]
fn it_network_security_config_file() {
    let mut manifest = Manifest::default();
    assert!(network_security_config_file(&manifest).is_none());

    manifest.application_mut().network_security_config =
        Some(ResourceRef::resolve("@xml/network_security_config"));
    assert_eq!(
        network_security_config_file(&manifest).and_then(ResourceRef::file),
        Some("res/xml/network_security_config.xml")
    );
}

#[test]
fn it_nsc_cleartext_table() {
    // target, base cleartextTrafficPermitted, expected base policy.
    let cases = [
        (23, Some(true), true),
        (28, Some(true), true),
        (32, Some(true), true),
        (23, Some(false), false),
        (30, Some(false), false),
        (23, None, true),
        (27, None, true),
        (28, None, false),
        (32, None, false),
    ];

    for &(target, declared, expected) in &cases {
        let nsc = NetworkSecurityConfig::new(
            Some(BaseConfig {
                cleartext_traffic_permitted: tribool(declared),
                trust_anchors: Vec::new(),
            }),
            vec![domain_config("a"), domain_config("b")],
            None,
        );

        let cleartext = nsc_cleartext(&nsc, &range(21, target, 33));
        assert_eq!(cleartext.base_permitted, expected, "target {}, {:?}", target, declared);
        assert_eq!(cleartext.defaulted, declared.is_none());
        // Both domains inherit the base value.
        if expected {
            assert_eq!(cleartext.permitted_domains, vec!["a", "b"]);
        } else {
            assert_eq!(cleartext.forbidden_domains, vec!["a", "b"]);
        }
    }
}

#[test]
fn it_nsc_cleartext_domains() {
    let mut forbidden = domain_config("secure.example.com");
    forbidden.cleartext_traffic_permitted = TriBool::False;
    forbidden.domain_configs.push(domain_config("nested.example.com"));
    let nsc = NetworkSecurityConfig::new(None, vec![forbidden, domain_config("other.com")], None);

    let cleartext = nsc_cleartext(&nsc, &range(21, 27, 33));
    assert!(cleartext.base_permitted);
    assert_eq!(cleartext.permitted_domains, vec!["other.com"]);
    assert_eq!(
        cleartext.forbidden_domains,
        vec!["secure.example.com", "nested.example.com"]
    );
}

#[test]
fn it_nsc_trust_anchors_table() {
    let c = || certificate("a", false);
    // API level, declared base anchors, trusted sources.
    let cases = vec![
        (20, vec![], 2),
        (23, vec![c(), c(), c()], 3),
        (20, vec![c(), c(), c(), c(), c(), c()], 6),
        (25, vec![], 1),
        (30, vec![], 1),
        (33, vec![c(), c(), c()], 3),
        (28, vec![], 1),
        (24, vec![c(), c(), c(), c(), c(), c()], 6),
    ];

    for (api, anchors, expected) in cases {
        let nsc = NetworkSecurityConfig::new(
            Some(BaseConfig {
                cleartext_traffic_permitted: TriBool::True,
                trust_anchors: anchors,
            }),
            vec![domain_config("aa")],
            None,
        );

        let sources = match trust_anchors(&nsc, &SdkRange::single(api)).base {
            BaseAnchors::Declared(anchors) => anchors.len(),
            BaseAnchors::Default(outcome) => outcome
                .as_single()
                .map(|d| d.sources())
                .unwrap_or_default(),
        };
        assert_eq!(sources, expected, "API {}", api);
    }
}

#[test]
fn it_nsc_trust_anchors_inheritance() {
    let nsc = NetworkSecurityConfig::new(
        None,
        vec![DomainConfig {
            trust_anchors: vec![certificate("user", false)],
            ..domain_config("debug.example.com")
        }],
        Some(vec![certificate("@raw/debug_ca", true)]),
    );

    let anchors = trust_anchors(&nsc, &range(21, 30, 33));
    assert_eq!(
        anchors.base,
        BaseAnchors::Default(split(
            24,
            single(DefaultTrustAnchors::SystemAndUser),
            single(DefaultTrustAnchors::SystemOnly)
        ))
    );
    assert!(anchors.base.trusts_user());
    assert_eq!(anchors.user_trusting_domains(), vec!["debug.example.com"]);
    assert_eq!(
        anchors.debug_overrides,
        Some(vec![certificate("@raw/debug_ca", true)])
    );
    assert!(!trust_anchors(&nsc, &range(24, 30, 33)).base.trusts_user());
}

#[test]
fn it_nsc_pinning() {
    let pin_set = |expiration: &str| PinSet {
        expiration: Some(expiration.to_owned()),
        pins: vec![("SHA-256".to_owned(), "7HIpactkIAq2Y49orFOOQKurWxmmSFZhBCoQYcRhJ3Y=".to_owned())],
    };
    let nsc = NetworkSecurityConfig::new(
        Some(BaseConfig {
            cleartext_traffic_permitted: TriBool::Unset,
            trust_anchors: vec![certificate("system", false), certificate("user", true)],
        }),
        vec![
            DomainConfig {
                pin_set: Some(pin_set("2012-01-01")),
                ..domain_config("old.example.com")
            },
            DomainConfig {
                pin_set: Some(pin_set("2100-01-01")),
                trust_anchors: vec![certificate("@raw/ca", false)],
                ..domain_config("new.example.com")
            },
            DomainConfig {
                pin_set: Some(pin_set("not a date")),
                ..domain_config("bad.example.com")
            },
            domain_config("unpinned.example.com"),
        ],
        None,
    );

    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let pinning = pinning(&nsc, today);
    assert_eq!(pinning.len(), 3);

    assert_eq!(pinning[0].domain, "old.example.com");
    assert_eq!(pinning[0].expired, Some(true));
    assert_eq!(pinning[0].pins, 1);
    assert_eq!(pinning[0].override_pins, vec!["user".to_owned()]);

    assert_eq!(pinning[1].expired, Some(false));
    assert!(pinning[1].override_pins.is_empty());

    assert_eq!(pinning[2].expiration.as_deref(), Some("not a date"));
    assert_eq!(pinning[2].expired, None);
}
