use serde_plain::{derive_deserialize_from_fromstr, derive_serialize_from_display};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Represents a parsed Kubernetes version. Examples of valid values when parsing:
/// - `v1.21`
/// - `1.21`
/// - `v1.21.1`
/// - `1.21.14-gke.700` (GKE reports master versions with a build suffix which is ignored)
/// Versions compare without regard to whether the patch was given, `v1.21` equals `v1.21.0`.
#[derive(Clone, Copy, Debug, Default)]
pub struct K8sVersion {
    major: u8,
    minor: u8,
    patch: Option<u8>,
}

impl K8sVersion {
    pub const fn new(major: u8, minor: u8, patch: Option<u8>) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn major(&self) -> u8 {
        self.major
    }

    pub fn minor(&self) -> u8 {
        self.minor
    }

    /// Returns a string representation of the Kubernetes version without a v prefix, and only
    /// includes the major and minor versions (event if a patch value is present). Example: `1.21`.
    pub fn major_minor_without_v(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }

    /// Returns a string representation of the Kubernetes version with a v prefix. Includes the
    /// patch value if it exists. Examples: `v1.21.1` when a patch value exists, or `v1.21` if the
    /// patch value is `None`.
    pub fn full_version_with_v(&self) -> String {
        match self.patch {
            Some(patch) => format!("v{}.{}.{}", self.major, self.minor, patch),
            None => format!("v{}.{}", self.major, self.minor),
        }
    }

    /// Returns a string representation of the Kubernetes version without a v prefix. This is the
    /// form `gcloud --cluster-version` expects.
    pub fn full_version_without_v(&self) -> String {
        match self.patch {
            Some(patch) => format!("{}.{}.{}", self.major, self.minor, patch),
            None => self.major_minor_without_v(),
        }
    }

    pub fn parse<S: AsRef<str>>(s: S) -> std::result::Result<Self, String> {
        let original = s.as_ref().trim();
        let no_v = original.strip_prefix('v').unwrap_or(original);
        // Drop distribution suffixes such as `-gke.700`.
        let no_suffix = no_v.split(['-', '+']).next().unwrap_or(no_v);
        let mut iter = no_suffix.split('.');
        let major = iter
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                format!(
                    "Unable to find the major version number when parsing '{}' as a k8s version",
                    original
                )
            })?
            .parse::<u8>()
            .map_err(|e| {
                format!(
                    "Error when parsing the major version number of a k8s version: {}",
                    e
                )
            })?;
        let minor = iter
            .next()
            .ok_or_else(|| {
                format!(
                    "Unable to find the minor version number when parsing '{}' as a k8s version",
                    original
                )
            })?
            .parse::<u8>()
            .map_err(|e| {
                format!(
                    "Error when parsing the minor version number of a k8s version: {}",
                    e
                )
            })?;
        let patch = iter
            .next()
            .map(|s| {
                s.parse::<u8>().map_err(|e| {
                    format!(
                        "Error when parsing the patch version number of '{}' as a k8s version: {}",
                        original, e
                    )
                })
            })
            .transpose()?;
        if iter.next().is_some() {
            return Err(format!(
                "Too many version components when parsing '{}' as a k8s version",
                original
            ));
        }
        Ok(Self {
            major,
            minor,
            patch,
        })
    }
}

impl K8sVersion {
    fn key(&self) -> (u8, u8, u8) {
        (self.major, self.minor, self.patch.unwrap_or(0))
    }
}

impl PartialEq for K8sVersion {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for K8sVersion {}

impl Hash for K8sVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state)
    }
}

impl Ord for K8sVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for K8sVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for K8sVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.full_version_with_v(), f)
    }
}

impl FromStr for K8sVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        K8sVersion::parse(s)
    }
}

derive_serialize_from_display!(K8sVersion);
derive_deserialize_from_fromstr!(K8sVersion, "k8s version such as v1.21 or 1.21.1");

#[test]
fn k8s_version_invalid() {
    assert!(K8sVersion::parse("1.foo").is_err());
    assert!(K8sVersion::parse("").is_err());
    assert!(K8sVersion::parse("v1").is_err());
    assert!(K8sVersion::parse("1.24.foo").is_err());
    assert!(K8sVersion::parse("1.27.300").is_err());
    assert!(K8sVersion::parse("1.24.1.2").is_err());
}

#[test]
fn k8s_version_missing_patch_is_zero() {
    use std::collections::HashSet;
    let without_patch = K8sVersion::parse("v1.9").unwrap();
    let with_patch = K8sVersion::parse("v1.9.0").unwrap();
    assert_eq!(Ordering::Equal, without_patch.cmp(&with_patch));
    assert_eq!(without_patch, with_patch);
    let versions: HashSet<K8sVersion> = [without_patch, with_patch].into_iter().collect();
    assert_eq!(1, versions.len());
    assert_ne!(without_patch, K8sVersion::parse("v1.9.1").unwrap());
}

#[test]
fn k8s_version_valid() {
    let k8s_version = K8sVersion::from_str("v1.21.3").unwrap();
    assert_eq!("1.21", k8s_version.major_minor_without_v());
    assert_eq!("v1.21.3", k8s_version.full_version_with_v());
    assert_eq!("1.21.3", k8s_version.full_version_without_v());
}

#[test]
fn k8s_version_gke_suffix() {
    let k8s_version = K8sVersion::parse("1.24.10-gke.2300").unwrap();
    assert_eq!(K8sVersion::new(1, 24, Some(10)), k8s_version);
}

#[test]
fn k8s_version_ordering() {
    let minimum = K8sVersion::new(1, 9, None);
    assert!(K8sVersion::parse("1.10").unwrap() > minimum);
    assert!(K8sVersion::parse("v1.9.0").unwrap() >= minimum);
    assert!(K8sVersion::parse("1.8.15").unwrap() < minimum);
}
