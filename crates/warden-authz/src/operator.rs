// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Operator semantics shared by conditions and attribute principals.
//!
//! Operands are optional: a path that resolves to nothing is `None`, which is
//! treated the same as an explicit [`AttrValue::Null`].

use std::cmp::Ordering;

use crate::attributes::AttrValue;
use crate::policy::Operator;

impl Operator {
	/// Evaluates `left <op> right`.
	pub fn evaluate(&self, left: Option<&AttrValue>, right: Option<&AttrValue>) -> bool {
		let left = left.filter(|v| !v.is_null());
		let right = right.filter(|v| !v.is_null());

		match self {
			Operator::Equals => left == right,
			Operator::NotEquals => left != right,
			Operator::In => contains(right, left),
			Operator::NotIn => !contains(right, left),
			Operator::GreaterThan => compare_numeric(left, right) == Ordering::Greater,
			Operator::LessThan => compare_numeric(left, right) == Ordering::Less,
			Operator::GreaterThanOrEqual => compare_numeric(left, right) != Ordering::Less,
			Operator::LessThanOrEqual => compare_numeric(left, right) != Ordering::Greater,
			Operator::StringLike => {
				match (left.and_then(AttrValue::as_str), right.and_then(AttrValue::as_str)) {
					(Some(value), Some(pattern)) => string_like(value, pattern),
					_ => false,
				}
			}
			Operator::Exists => left.is_some(),
			Operator::NotExists => left.is_none(),
			Operator::Unknown => false,
		}
	}
}

/// Free-function form of [`Operator::evaluate`].
pub fn evaluate_operator(
	operator: Operator,
	left: Option<&AttrValue>,
	right: Option<&AttrValue>,
) -> bool {
	operator.evaluate(left, right)
}

/// Membership test. `haystack` must be a list; anything else contains nothing.
fn contains(haystack: Option<&AttrValue>, needle: Option<&AttrValue>) -> bool {
	let Some(items) = haystack.and_then(AttrValue::as_list) else {
		return false;
	};
	match needle {
		Some(needle) => items.iter().any(|item| item == needle),
		None => items.iter().any(AttrValue::is_null),
	}
}

/// Compares two operands as `f64`.
///
/// Operands that are not numeric make the comparison come out `Equal`. That
/// keeps `>=`/`<=` true and `>`/`<` false for mistyped policies.
fn compare_numeric(left: Option<&AttrValue>, right: Option<&AttrValue>) -> Ordering {
	match (left.and_then(AttrValue::as_f64), right.and_then(AttrValue::as_f64)) {
		(Some(l), Some(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
		_ => Ordering::Equal,
	}
}

/// Glob match supporting only a single leading or trailing `*`.
///
/// `*suffix` matches by suffix, `prefix*` by prefix; anything else, including
/// a `*` in the middle, is compared literally.
pub fn string_like(value: &str, pattern: &str) -> bool {
	if let Some(suffix) = pattern.strip_prefix('*') {
		return value.ends_with(suffix);
	}
	if let Some(prefix) = pattern.strip_suffix('*') {
		return value.starts_with(prefix);
	}
	value == pattern
}
