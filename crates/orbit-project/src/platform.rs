use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single compilation target.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SimplePlatform {
    Jvm,
    Js,
    Wasm,
    /// Kotlin/Native target (e.g. `linux_x64`).
    ///
    /// `None` is the unspecified native platform. Shared native source sets that have not been
    /// commonized yet carry it as a wildcard for "any native target".
    Native(Option<String>),
}

impl SimplePlatform {
    pub fn native(target: impl Into<String>) -> Self {
        SimplePlatform::Native(Some(target.into()))
    }

    pub const fn unspecified_native() -> Self {
        SimplePlatform::Native(None)
    }

    pub fn is_native(&self) -> bool {
        matches!(self, SimplePlatform::Native(_))
    }
}

impl fmt::Display for SimplePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimplePlatform::Jvm => f.write_str("jvm"),
            SimplePlatform::Js => f.write_str("js"),
            SimplePlatform::Wasm => f.write_str("wasm"),
            SimplePlatform::Native(None) => f.write_str("native"),
            SimplePlatform::Native(Some(target)) => write!(f, "native:{target}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformParseError {
    #[error("unknown platform `{0}`")]
    Unknown(String),
    #[error("native platform target must not be empty")]
    EmptyNativeTarget,
    #[error("target platform must have at least one component")]
    Empty,
}

impl FromStr for SimplePlatform {
    type Err = PlatformParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        if let Some(target) = text.strip_prefix("native:") {
            let target = target.trim();
            if target.is_empty() {
                return Err(PlatformParseError::EmptyNativeTarget);
            }
            return Ok(SimplePlatform::native(target));
        }

        match text.to_ascii_lowercase().as_str() {
            "jvm" => Ok(SimplePlatform::Jvm),
            "js" => Ok(SimplePlatform::Js),
            "wasm" => Ok(SimplePlatform::Wasm),
            "native" => Ok(SimplePlatform::Native(None)),
            _ => Err(PlatformParseError::Unknown(text.to_owned())),
        }
    }
}

/// A set of [`SimplePlatform`]s a module or library is compiled for.
///
/// A platform with more than one component is "common" (shared between targets). The
/// serialized form is a list of component strings, e.g. `["jvm", "js"]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct TargetPlatform {
    components: BTreeSet<SimplePlatform>,
}

impl TargetPlatform {
    pub fn new(
        components: impl IntoIterator<Item = SimplePlatform>,
    ) -> Result<Self, PlatformParseError> {
        let components: BTreeSet<_> = components.into_iter().collect();
        if components.is_empty() {
            return Err(PlatformParseError::Empty);
        }
        Ok(Self { components })
    }

    fn single(platform: SimplePlatform) -> Self {
        Self {
            components: BTreeSet::from([platform]),
        }
    }

    pub fn jvm() -> Self {
        Self::single(SimplePlatform::Jvm)
    }

    pub fn js() -> Self {
        Self::single(SimplePlatform::Js)
    }

    pub fn wasm() -> Self {
        Self::single(SimplePlatform::Wasm)
    }

    pub fn native(target: impl Into<String>) -> Self {
        Self::single(SimplePlatform::native(target))
    }

    pub fn unspecified_native() -> Self {
        Self::single(SimplePlatform::unspecified_native())
    }

    pub fn components(&self) -> impl ExactSizeIterator<Item = &SimplePlatform> + '_ {
        self.components.iter()
    }

    pub fn contains(&self, platform: &SimplePlatform) -> bool {
        self.components.contains(platform)
    }

    /// Returns the only component of a single-target platform.
    pub fn single_component(&self) -> Option<&SimplePlatform> {
        if self.components.len() == 1 {
            self.components.iter().next()
        } else {
            None
        }
    }

    pub fn is_superset_of(&self, other: &TargetPlatform) -> bool {
        self.components.is_superset(&other.components)
    }

    pub fn is_jvm(&self) -> bool {
        self.single_component() == Some(&SimplePlatform::Jvm)
    }

    pub fn is_js(&self) -> bool {
        self.single_component() == Some(&SimplePlatform::Js)
    }

    pub fn is_wasm(&self) -> bool {
        self.single_component() == Some(&SimplePlatform::Wasm)
    }

    pub fn is_native(&self) -> bool {
        self.components.iter().all(SimplePlatform::is_native)
    }

    pub fn is_common(&self) -> bool {
        self.components.len() > 1
    }

    pub fn is_shared_native(&self) -> bool {
        self.is_common() && self.is_native()
    }

    /// Whether code compiled for `self` may see declarations from a library built for `other`.
    ///
    /// With hierarchical multiplatform (HMPP) enabled, every target of `self` must be covered by
    /// `other`; native targets are also covered by the unspecified native wildcard. Without HMPP
    /// only same-kind pairs are compatible.
    pub fn can_depend_on(&self, other: &TargetPlatform, hmpp_enabled: bool) -> bool {
        if hmpp_enabled {
            let mut uncovered = self.components.difference(&other.components).peekable();
            if uncovered.peek().is_none() {
                return true;
            }
            return uncovered.all(SimplePlatform::is_native)
                && other.contains(&SimplePlatform::unspecified_native());
        }

        (self.is_jvm() && other.is_jvm())
            || (self.is_js() && other.is_js())
            || (self.is_wasm() && other.is_wasm())
            || (self.is_native() && other.is_native())
            || (self.is_common() && other.is_common())
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, component) in self.components.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            component.fmt(f)?;
        }
        Ok(())
    }
}

impl FromStr for TargetPlatform {
    type Err = PlatformParseError;

    /// Parses a comma-separated component list, e.g. `jvm,js` or `native:linux_x64`.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let components = text
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<SimplePlatform>, _>>()?;
        Self::new(components)
    }
}

impl TryFrom<Vec<String>> for TargetPlatform {
    type Error = PlatformParseError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        let components = value
            .iter()
            .map(|text| text.parse())
            .collect::<Result<Vec<SimplePlatform>, _>>()?;
        Self::new(components)
    }
}

impl From<TargetPlatform> for Vec<String> {
    fn from(value: TargetPlatform) -> Self {
        value.components.iter().map(ToString::to_string).collect()
    }
}
