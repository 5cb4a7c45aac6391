//! Decoded control messages
//!
//! A message is an address followed by zero or more argument atoms. The
//! transport that produced it has already decoded the wire format; the filter
//! only ever looks at the address.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single argument atom
///
/// Untagged in serde, so a JSON array always reads back as [`OscArg::Array`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OscArg {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    /// Nested list, e.g. raw harmonic gains or a pitch-tracker note set
    Array(Vec<OscArg>),
    Blob(Vec<u8>),
    Nil,
}

impl fmt::Display for OscArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OscArg::Int(v) => write!(f, "{}", v),
            OscArg::Float(v) => write!(f, "{}", v),
            OscArg::Bool(v) => write!(f, "{}", v),
            OscArg::Str(v) => f.write_str(v),
            OscArg::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            OscArg::Blob(v) => write!(f, "<blob {} bytes>", v.len()),
            OscArg::Nil => f.write_str("nil"),
        }
    }
}

impl From<i64> for OscArg {
    fn from(v: i64) -> Self {
        OscArg::Int(v)
    }
}

impl From<i32> for OscArg {
    fn from(v: i32) -> Self {
        OscArg::Int(v.into())
    }
}

impl From<f64> for OscArg {
    fn from(v: f64) -> Self {
        OscArg::Float(v)
    }
}

impl From<f32> for OscArg {
    fn from(v: f32) -> Self {
        OscArg::Float(v.into())
    }
}

impl From<bool> for OscArg {
    fn from(v: bool) -> Self {
        OscArg::Bool(v)
    }
}

impl From<&str> for OscArg {
    fn from(v: &str) -> Self {
        OscArg::Str(v.to_string())
    }
}

impl From<String> for OscArg {
    fn from(v: String) -> Self {
        OscArg::Str(v)
    }
}

impl From<Vec<OscArg>> for OscArg {
    fn from(v: Vec<OscArg>) -> Self {
        OscArg::Array(v)
    }
}

impl From<Vec<u8>> for OscArg {
    fn from(v: Vec<u8>) -> Self {
        OscArg::Blob(v)
    }
}

/// An address plus its arguments
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OscMessage {
    /// Leading identifier; `None` for an empty message
    pub address: Option<String>,
    /// Arguments in arrival order
    pub args: Vec<OscArg>,
}

impl OscMessage {
    pub fn new(address: impl Into<String>, args: Vec<OscArg>) -> Self {
        Self {
            address: Some(address.into()),
            args,
        }
    }

    /// Build a message from a flat atom list.
    ///
    /// The first atom is the identifier, stringified when it is not a string.
    pub fn from_atoms(atoms: Vec<OscArg>) -> Self {
        let mut atoms = atoms.into_iter();
        let address = atoms.next().map(|first| match first {
            OscArg::Str(s) => s,
            other => other.to_string(),
        });

        Self {
            address,
            args: atoms.collect(),
        }
    }

    /// Identifier, or `""` when the message has none
    #[inline]
    pub fn address_str(&self) -> &str {
        self.address.as_deref().unwrap_or_default()
    }

    /// Flatten back into identifier-first atoms
    pub fn into_atoms(self) -> Vec<OscArg> {
        let mut atoms = Vec::with_capacity(self.args.len() + 1);
        if let Some(address) = self.address {
            atoms.push(OscArg::Str(address));
        }
        atoms.extend(self.args);
        atoms
    }
}

impl fmt::Display for OscMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.address_str())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

impl Serialize for OscMessage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.clone().into_atoms().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OscMessage {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<OscArg>::deserialize(deserializer).map(OscMessage::from_atoms)
    }
}

/// Build an [`OscMessage`] from an address and argument expressions
///
/// ```
/// use mrposc_filter::osc;
///
/// let msg = osc!("/midi", 144, 90, 60);
/// assert_eq!(msg.args.len(), 3);
/// ```
#[macro_export]
macro_rules! osc {
    ($address:expr $(, $arg:expr)* $(,)?) => {
        $crate::message::OscMessage::new(
            $address,
            vec![$($crate::message::OscArg::from($arg)),*],
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_atoms() {
        let msg = OscMessage::from_atoms(vec!["/midi".into(), 144.into(), 90.into(), 60.into()]);
        assert_eq!(msg.address.as_deref(), Some("/midi"));
        assert_eq!(msg.args, vec![OscArg::Int(144), OscArg::Int(90), OscArg::Int(60)]);
    }

    #[test]
    fn test_from_atoms_empty() {
        let msg = OscMessage::from_atoms(Vec::new());
        assert!(msg.address.is_none());
        assert_eq!(msg.address_str(), "");
        assert!(msg.args.is_empty());
    }

    #[test]
    fn test_from_atoms_stringifies_identifier() {
        let msg = OscMessage::from_atoms(vec![OscArg::Int(7), OscArg::Float(0.5)]);
        assert_eq!(msg.address.as_deref(), Some("7"));
        assert_eq!(msg.args, vec![OscArg::Float(0.5)]);
    }

    #[test]
    fn test_into_atoms_preserves_order() {
        let msg = osc!("/ui/volume", 0.8, "x", true);
        assert_eq!(
            msg.into_atoms(),
            vec![
                OscArg::Str("/ui/volume".to_string()),
                OscArg::Float(0.8),
                OscArg::Str("x".to_string()),
                OscArg::Bool(true),
            ]
        );
    }

    #[test]
    fn test_json_shape() {
        let msg: OscMessage = serde_json::from_str(r#"["/midi", 144, 90, 60]"#).unwrap();
        assert_eq!(msg, osc!("/midi", 144, 90, 60));
        assert_eq!(
            serde_json::to_string(&osc!("/ui/volume", 0.8)).unwrap(),
            r#"["/ui/volume",0.8]"#
        );
    }

    #[test]
    fn test_json_nested_lists() {
        let json = r#"["/quality/harmonics/raw",0,60,[0.5,0.25,1.0]]"#;
        let msg: OscMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg.args,
            vec![
                OscArg::Int(0),
                OscArg::Int(60),
                OscArg::Array(vec![
                    OscArg::Float(0.5),
                    OscArg::Float(0.25),
                    OscArg::Float(1.0),
                ]),
            ]
        );
        assert_eq!(serde_json::to_string(&msg).unwrap(), json);

        let json = r#"["/ptrk/mute",[60,300,[-1]]]"#;
        let msg: OscMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg.args,
            vec![OscArg::Array(vec![
                OscArg::Int(60),
                OscArg::Int(300),
                OscArg::Array(vec![OscArg::Int(-1)]),
            ])]
        );
        assert_eq!(serde_json::to_string(&msg).unwrap(), json);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            osc!("/ptrk/mute", vec![OscArg::Int(60), OscArg::Int(62)]).to_string(),
            "/ptrk/mute [60, 62]"
        );
        assert_eq!(osc!("/midi", 144, 90, 60).to_string(), "/midi 144 90 60");
        assert_eq!(OscMessage::default().to_string(), "");
    }
}
