//! ScenePath parsing and formatting.
//!
//! Grammar ('/'-separated, leading/trailing '/' trimmed):
//!   `!Name`   descend to the direct child called `Name`
//!   `:Type`   select the behavior of runtime type `Type` on the current node
//!   field     dotted field path, optional `[n]` index, optional `.x|.y|.z|.w|.r|.g|.b|.a`
//!
//! Descent segments come first, then at most one behavior segment, then exactly
//! one field segment. Examples:
//!   "!Arm/!Hand/Position.y" -> descent=["Arm","Hand"], field="Position", lane 1
//!   "!Lamp/:Light/tint.g"   -> descent=["Lamp"], behavior="Light", field="tint", lane 1
//!   ":Rig/weights[2]"       -> behavior="Rig", field="weights", index 2
//!
//! A ScenePath only describes the address; resolving it against a live scene is
//! the job of the animation core.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Syntax errors produced by [`ScenePath::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty path")]
    Empty,
    #[error("empty segment in path")]
    EmptySegment,
    #[error("segment '{0}' contains whitespace")]
    Whitespace(String),
    #[error("path has no field segment")]
    MissingField,
    #[error("descent segment '{0}' follows the behavior segment")]
    DescentAfterBehavior(String),
    #[error("segment '{0}' follows the field segment")]
    TrailingSegment(String),
    #[error("more than one behavior segment ('{0}')")]
    DuplicateBehavior(String),
    #[error("index follows a component suffix in '{0}'")]
    IndexAfterSuffix(String),
    #[error("malformed index in '{0}'")]
    BadIndex(String),
}

/// Which suffix alphabet a component was written in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SuffixFamily {
    /// `.x .y .z .w`
    Vector,
    /// `.r .g .b .a`
    Color,
}

/// A trailing component selector split off the field segment.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ComponentSuffix {
    pub lane: usize,
    pub family: SuffixFamily,
}

impl ComponentSuffix {
    pub fn from_char(c: char) -> Option<Self> {
        let (lane, family) = match c {
            'x' => (0, SuffixFamily::Vector),
            'y' => (1, SuffixFamily::Vector),
            'z' => (2, SuffixFamily::Vector),
            'w' => (3, SuffixFamily::Vector),
            'r' => (0, SuffixFamily::Color),
            'g' => (1, SuffixFamily::Color),
            'b' => (2, SuffixFamily::Color),
            'a' => (3, SuffixFamily::Color),
            _ => return None,
        };
        Some(Self { lane, family })
    }

    pub fn as_char(self) -> char {
        let table = match self.family {
            SuffixFamily::Vector => ['x', 'y', 'z', 'w'],
            SuffixFamily::Color => ['r', 'g', 'b', 'a'],
        };
        table[self.lane.min(3)]
    }

    /// Recognise a `.c` suffix piece (the text after the last '.').
    fn from_piece(piece: &str) -> Option<Self> {
        let mut chars = piece.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => None,
        }
    }
}

/// Terminal field address on a behavior (or a built-in node alias).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    /// Dotted name, kept whole because the registry keys on it.
    pub name: String,
    /// Zero-based collection index from a trailing `[n]`.
    pub index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScenePath {
    /// Child names to descend through, in order.
    pub descent: Vec<String>,
    /// Behavior type name, when a `:Type` segment is present.
    pub behavior: Option<String>,
    pub field: FieldPath,
    pub component: Option<ComponentSuffix>,
}

fn check_whitespace(seg: &str) -> Result<(), PathError> {
    if seg.chars().any(char::is_whitespace) {
        return Err(PathError::Whitespace(seg.to_string()));
    }
    Ok(())
}

fn parse_field(seg: &str) -> Result<(FieldPath, Option<ComponentSuffix>), PathError> {
    let mut rest = seg;

    let mut component = None;
    if let Some((head, piece)) = rest.rsplit_once('.') {
        if let Some(c) = ComponentSuffix::from_piece(piece) {
            component = Some(c);
            rest = head;
        }
    }

    let mut index = None;
    if let Some(head) = rest.strip_suffix(']') {
        let (name, idx) = head
            .rsplit_once('[')
            .ok_or_else(|| PathError::BadIndex(seg.to_string()))?;
        let parsed = idx
            .parse::<usize>()
            .map_err(|_| PathError::BadIndex(seg.to_string()))?;
        // "bar.x[2]": the index was written after a suffix.
        if component.is_none() {
            if let Some((_, piece)) = name.rsplit_once('.') {
                if ComponentSuffix::from_piece(piece).is_some() {
                    return Err(PathError::IndexAfterSuffix(seg.to_string()));
                }
            }
        }
        index = Some(parsed);
        rest = name;
    }

    if rest.contains('[') || rest.contains(']') {
        return Err(PathError::BadIndex(seg.to_string()));
    }
    if rest.is_empty() || rest.split('.').any(str::is_empty) {
        return Err(PathError::EmptySegment);
    }

    Ok((
        FieldPath {
            name: rest.to_string(),
            index,
        },
        component,
    ))
}

impl ScenePath {
    /// Parse a path string according to the grammar described above.
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let trimmed = s.trim_matches('/');
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }

        let mut descent = Vec::new();
        let mut behavior: Option<String> = None;
        let mut field: Option<(FieldPath, Option<ComponentSuffix>)> = None;

        for seg in trimmed.split('/') {
            if seg.is_empty() {
                return Err(PathError::EmptySegment);
            }
            check_whitespace(seg)?;
            if field.is_some() {
                return Err(PathError::TrailingSegment(seg.to_string()));
            }

            if let Some(name) = seg.strip_prefix('!') {
                if name.is_empty() {
                    return Err(PathError::EmptySegment);
                }
                if behavior.is_some() {
                    return Err(PathError::DescentAfterBehavior(seg.to_string()));
                }
                descent.push(name.to_string());
            } else if let Some(name) = seg.strip_prefix(':') {
                if name.is_empty() {
                    return Err(PathError::EmptySegment);
                }
                if behavior.is_some() {
                    return Err(PathError::DuplicateBehavior(seg.to_string()));
                }
                behavior = Some(name.to_string());
            } else {
                field = Some(parse_field(seg)?);
            }
        }

        let (field, component) = field.ok_or(PathError::MissingField)?;
        Ok(ScenePath {
            descent,
            behavior,
            field,
            component,
        })
    }

    /// Return the behavior type name, if the path selects one.
    pub fn behavior_name(&self) -> Option<&str> {
        self.behavior.as_deref()
    }

    /// Iterate over the child names to descend through.
    pub fn descent(&self) -> impl Iterator<Item = &str> {
        self.descent.iter().map(|s| s.as_str())
    }
}

impl fmt::Display for ScenePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for child in &self.descent {
            write!(f, "!{child}/")?;
        }
        if let Some(b) = &self.behavior {
            write!(f, ":{b}/")?;
        }
        f.write_str(&self.field.name)?;
        if let Some(i) = self.field.index {
            write!(f, "[{i}]")?;
        }
        if let Some(c) = self.component {
            write!(f, ".{}", c.as_char())?;
        }
        Ok(())
    }
}

impl FromStr for ScenePath {
    type Err = PathError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScenePath::parse(s)
    }
}

// Serde support: serialize as string, deserialize from string
impl Serialize for ScenePath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ScenePath {
    fn deserialize<D>(deserializer: D) -> Result<ScenePath, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ScenePath::parse(&s).map_err(de::Error::custom)
    }
}
