//! Static directory documents used across harnesses.

use std::path::{Path, PathBuf};

/// The single-user store used by the bind scenarios.
pub const ALICE_JSON: &str = r#"{
    "uid=alice,o=x": { "userpassword": "secret", "cn": "Alice" }
}"#;

/// One entry with a multi-valued `mail`.
pub const MAIL_JSON: &str = r#"{
    "cn=x,o=y": { "mail": ["a@x.com", "b@x.com"] }
}"#;

/// A small organisation: people, a group, binary values and a `dn` attribute.
pub const ORG_JSON: &str = r#"{
    "dc=example,dc=org": {
        "objectClass": ["top", "domain"],
        "dc": "example"
    },
    "ou=people,dc=example,dc=org": {
        "objectClass": ["top", "organizationalUnit"],
        "ou": "people"
    },
    "uid=ada,ou=people,dc=example,dc=org": {
        "dn": "uid=ada,ou=people,dc=example,dc=org",
        "objectClass": ["top", "person", "inetOrgPerson"],
        "uid": "ada",
        "cn": "Ada Lovelace",
        "sn": "Lovelace",
        "mail": ["ada@example.org", "countess@example.org"],
        "userPassword": "analytical",
        "jpegPhoto": "{hex}ffd8ffe0"
    },
    "uid=grace,ou=people,dc=example,dc=org": {
        "objectClass": ["top", "person", "inetOrgPerson"],
        "uid": "grace",
        "cn": "Grace Hopper",
        "sn": "Hopper",
        "mail": "grace@example.org",
        "userPassword": ["cobol", "flowmatic"]
    },
    "cn=admins,ou=groups,dc=example,dc=org": {
        "objectClass": ["top", "groupOfNames"],
        "cn": "admins",
        "member": ["uid=ada,ou=people,dc=example,dc=org"]
    }
}"#;

/// Write `json` as `data.json` inside `dir` and return its path.
pub fn write_data_file(dir: &Path, json: &str) -> PathBuf {
    let path = dir.join("data.json");
    std::fs::write(&path, json).expect("write data file");
    path
}
