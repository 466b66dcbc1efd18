// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute values and attribute-path resolution.
//!
//! Every fact the evaluator looks at is an [`AttrValue`] stored in a flat,
//! string-keyed [`Attributes`] map. Three maps take part in an evaluation:
//!
//! - subject attributes (who is asking)
//! - resource attributes (what is being accessed)
//! - environment attributes (client IP, HTTP method, request id, ...)
//!
//! Condition paths select a map with a `$subject.`, `$resource.` or
//! `$environment.` prefix. Unprefixed paths fall back through resource,
//! subject and environment, in that order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Prefix routing a path to the subject attribute set.
pub const SUBJECT_PREFIX: &str = "$subject.";
/// Prefix routing a path to the resource attribute set.
pub const RESOURCE_PREFIX: &str = "$resource.";
/// Prefix routing a path to the environment attribute set.
pub const ENVIRONMENT_PREFIX: &str = "$environment.";

/// A flat attribute map.
///
/// Ordered by key so that serialized forms are deterministic. Values are owned,
/// so handing a map across a store boundary always hands over a copy.
pub type Attributes = BTreeMap<String, AttrValue>;

/// A single attribute value.
///
/// Serialized without a tag so that plain JSON maps onto it directly:
/// `null`, `true`, `42`, `1.5`, `"admin"`, `["a", "b"]`, `{"k": "v"}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
	#[default]
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	String(String),
	List(Vec<AttrValue>),
	Map(BTreeMap<String, AttrValue>),
}

impl AttrValue {
	/// Returns true for the null value.
	pub fn is_null(&self) -> bool {
		matches!(self, AttrValue::Null)
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			AttrValue::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<&[AttrValue]> {
		match self {
			AttrValue::List(items) => Some(items),
			_ => None,
		}
	}

	/// Widens any numeric value to `f64`.
	///
	/// Integers and floats both coerce; every other kind returns `None`.
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			AttrValue::Int(i) => Some(*i as f64),
			AttrValue::Float(f) => Some(*f),
			_ => None,
		}
	}

	/// Returns the `$`-reference carried by a string value, if any.
	pub fn as_reference(&self) -> Option<&str> {
		self.as_str().filter(|s| s.starts_with('$'))
	}
}

impl PartialEq for AttrValue {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(AttrValue::Null, AttrValue::Null) => true,
			(AttrValue::Bool(a), AttrValue::Bool(b)) => a == b,
			(AttrValue::Int(a), AttrValue::Int(b)) => a == b,
			(AttrValue::String(a), AttrValue::String(b)) => a == b,
			(AttrValue::List(a), AttrValue::List(b)) => a == b,
			(AttrValue::Map(a), AttrValue::Map(b)) => a == b,
			_ => match (self.as_f64(), other.as_f64()) {
				(Some(a), Some(b)) => a == b,
				_ => false,
			},
		}
	}
}

impl From<&str> for AttrValue {
	fn from(value: &str) -> Self {
		AttrValue::String(value.to_string())
	}
}

impl From<String> for AttrValue {
	fn from(value: String) -> Self {
		AttrValue::String(value)
	}
}

impl From<bool> for AttrValue {
	fn from(value: bool) -> Self {
		AttrValue::Bool(value)
	}
}

impl From<i32> for AttrValue {
	fn from(value: i32) -> Self {
		AttrValue::Int(i64::from(value))
	}
}

impl From<i64> for AttrValue {
	fn from(value: i64) -> Self {
		AttrValue::Int(value)
	}
}

impl From<u32> for AttrValue {
	fn from(value: u32) -> Self {
		AttrValue::Int(i64::from(value))
	}
}

impl From<f32> for AttrValue {
	fn from(value: f32) -> Self {
		AttrValue::Float(f64::from(value))
	}
}

impl From<f64> for AttrValue {
	fn from(value: f64) -> Self {
		AttrValue::Float(value)
	}
}

impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
	fn from(values: Vec<T>) -> Self {
		AttrValue::List(values.into_iter().map(Into::into).collect())
	}
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
	fn from(value: Option<T>) -> Self {
		value.map(Into::into).unwrap_or(AttrValue::Null)
	}
}

/// Looks up `key` in `attrs`.
///
/// The key is tried verbatim first. If it is absent and contains dots, the
/// segments are walked through nested [`AttrValue::Map`] values instead, so
/// `profile.department` finds `{"profile": {"department": "eng"}}`.
pub fn lookup<'a>(attrs: &'a Attributes, key: &str) -> Option<&'a AttrValue> {
	if let Some(value) = attrs.get(key) {
		return Some(value);
	}

	let mut segments = key.split('.');
	let first = segments.next()?;
	let mut current = attrs.get(first)?;
	let mut walked = false;
	for segment in segments {
		walked = true;
		match current {
			AttrValue::Map(inner) => current = inner.get(segment)?,
			_ => return None,
		}
	}

	walked.then_some(current)
}

/// The three attribute sets visible to one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct AttributeContext<'a> {
	pub subject: &'a Attributes,
	pub resource: &'a Attributes,
	pub environment: &'a Attributes,
}

impl<'a> AttributeContext<'a> {
	pub fn new(
		subject: &'a Attributes,
		resource: &'a Attributes,
		environment: &'a Attributes,
	) -> Self {
		Self {
			subject,
			resource,
			environment,
		}
	}

	/// Resolves a dotted attribute path.
	///
	/// Prefixed paths read only their own set. Unprefixed paths (with or
	/// without a bare leading `$`) try resource, then subject, then environment.
	pub fn resolve(&self, path: &str) -> Option<&'a AttrValue> {
		if let Some(key) = path.strip_prefix(SUBJECT_PREFIX) {
			return lookup(self.subject, key);
		}
		if let Some(key) = path.strip_prefix(RESOURCE_PREFIX) {
			return lookup(self.resource, key);
		}
		if let Some(key) = path.strip_prefix(ENVIRONMENT_PREFIX) {
			return lookup(self.environment, key);
		}

		let key = path.strip_prefix('$').unwrap_or(path);
		lookup(self.resource, key)
			.or_else(|| lookup(self.subject, key))
			.or_else(|| lookup(self.environment, key))
	}

	/// Resolves a path the way principal entries see it: subject first.
	///
	/// A `$subject.` prefix is optional; paths carrying another explicit
	/// prefix resolve through [`AttributeContext::resolve`].
	pub fn resolve_subject(&self, path: &str) -> Option<&'a AttrValue> {
		if path.starts_with(RESOURCE_PREFIX) || path.starts_with(ENVIRONMENT_PREFIX) {
			return self.resolve(path);
		}
		let key = path.strip_prefix(SUBJECT_PREFIX).unwrap_or(path);
		lookup(self.subject, key)
	}
}
