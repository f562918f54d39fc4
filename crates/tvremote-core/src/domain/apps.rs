//! Application descriptors and name resolution.
//!
//! Two sources can turn a human-entered name such as "netflix" into a launch
//! identifier:
//!
//! 1. The live list the receiver reports (`ed.installedApp.get`), searched by
//!    [`find_match`].
//! 2. [`KnownApps`], a static table of identifiers that popular applications
//!    use across regions and firmware generations.  A name maps to a *list* of
//!    candidates because the same application has different ids on different
//!    receivers; the launcher tries them in order.

use std::collections::BTreeMap;

use crate::protocol::messages::RawAppRecord;

/// An installed application as reported by the receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDescriptor {
    pub id: String,
    pub name: String,
}

impl AppDescriptor {
    /// Converts a raw record.  Records without any usable id are dropped.
    pub fn from_record(record: &RawAppRecord) -> Option<Self> {
        Some(Self {
            id: record.launch_id()?.to_string(),
            name: record.display_name().to_string(),
        })
    }
}

/// Finds the first app whose name equals `query` (case-insensitive), or
/// failing that, the first whose name contains it.
///
/// Returns `None` for a blank query.
pub fn find_match<'a>(apps: &'a [AppDescriptor], query: &str) -> Option<&'a AppDescriptor> {
    let needle = normalize(query);
    if needle.is_empty() {
        return None;
    }
    apps.iter()
        .find(|app| app.name.to_lowercase() == needle)
        .or_else(|| apps.iter().find(|app| app.name.to_lowercase().contains(&needle)))
}

/// Trimmed, lower-cased form used for every name comparison.
pub fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

// ── Static fallback table ─────────────────────────────────────────────────────

const NETFLIX: &[&str] = &["3201907018807", "11101200001", "Netflix", "netflixui2"];
const YOUTUBE: &[&str] = &["3201907018745", "111299001912", "YouTube", "youtube.leanback.v4"];
const PRIME: &[&str] = &[
    "3201512006785",
    "3201909019271",
    "3201606009684",
    "amazon",
    "PrimeVideo",
    "AmazonInstantVideo",
];
const PRIME_VIDEO: &[&str] = &[
    "3201512006785",
    "3201909019271",
    "3201606009684",
    "PrimeVideo",
    "AmazonInstantVideo",
];
const HOTSTAR: &[&str] = &["3201708012872", "Hotstar", "hotstar"];
const DISNEY_PLUS: &[&str] = &["3201901017640"];

const BUILTIN: &[(&str, &[&str])] = &[
    ("netflix", NETFLIX),
    ("youtube", YOUTUBE),
    ("prime", PRIME),
    ("prime video", PRIME_VIDEO),
    ("amazon prime video", PRIME_VIDEO),
    ("hotstar", HOTSTAR),
    ("disney+", DISNEY_PLUS),
    ("disney plus", DISNEY_PLUS),
];

/// Static name → candidate-id table.
///
/// Keys are matched exactly after trimming and lower-casing the query.
///
/// # Example
///
/// ```rust
/// use tvremote_core::KnownApps;
///
/// let table = KnownApps::default();
/// let ids = table.candidates("  Netflix ").unwrap();
/// assert_eq!(ids[0], "3201907018807");
/// assert!(table.candidates("solitaire").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownApps {
    entries: BTreeMap<String, Vec<String>>,
}

impl Default for KnownApps {
    fn default() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(name, ids)| {
                (
                    (*name).to_string(),
                    ids.iter().map(|id| (*id).to_string()).collect(),
                )
            })
            .collect();
        Self { entries }
    }
}

impl KnownApps {
    /// An empty table.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Adds or replaces entries.  Keys are normalised; entries with no ids are
    /// ignored.
    pub fn with_overrides<I, K>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<String>)>,
        K: AsRef<str>,
    {
        for (name, ids) in overrides {
            let key = normalize(name.as_ref());
            let ids: Vec<String> = ids.into_iter().filter(|id| !id.trim().is_empty()).collect();
            if key.is_empty() || ids.is_empty() {
                continue;
            }
            self.entries.insert(key, ids);
        }
        self
    }

    /// Candidate ids for `query`, in the order they should be tried.
    pub fn candidates(&self, query: &str) -> Option<&[String]> {
        self.entries.get(&normalize(query)).map(Vec::as_slice)
    }

    /// Every known name, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
