//! Contact identity and record types shared by sources and the model.

use std::fmt;

/// Opaque 64-bit contact identifier assigned by the upstream client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
pub struct ContactKey(pub i64);

impl ContactKey {
	pub const fn get(self) -> i64 {
		self.0
	}
}

impl From<i64> for ContactKey {
	fn from(value: i64) -> Self {
		Self(value)
	}
}

impl fmt::Display for ContactKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// Read-only view of one contact as published by the source.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContactRecord {
	pub key: ContactKey,
	pub first_name: String,
	pub last_name: String,
	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub username: Option<String>,
	#[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
	pub phone: Option<String>,
}

impl ContactRecord {
	pub fn new(key: impl Into<ContactKey>, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			first_name: first_name.into(),
			last_name: last_name.into(),
			username: None,
			phone: None,
		}
	}

	pub fn with_username(mut self, username: impl Into<String>) -> Self {
		self.username = Some(username.into());
		self
	}

	pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
		self.phone = Some(phone.into());
		self
	}

	/// Ordering key: first and last name joined by a single space.
	///
	/// Computed fresh on every call. Empty name parts are kept, so a contact
	/// with only a last name sorts on a leading space.
	pub fn sort_key(&self) -> String {
		let mut key = String::with_capacity(self.first_name.len() + self.last_name.len() + 1);
		key.push_str(&self.first_name);
		key.push(' ');
		key.push_str(&self.last_name);
		key
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sort_key_joins_names_with_single_space() {
		assert_eq!(ContactRecord::new(1, "Ann", "A").sort_key(), "Ann A");
		assert_eq!(ContactRecord::new(2, "", "Solo").sort_key(), " Solo");
		assert_eq!(ContactRecord::new(3, "Cher", "").sort_key(), "Cher ");
	}

	#[test]
	fn display_fields_do_not_affect_sort_key() {
		let plain = ContactRecord::new(4, "Sam", "K");
		let decorated = plain.clone().with_username("samk").with_phone("+100");
		assert_eq!(plain.sort_key(), decorated.sort_key());
		assert_ne!(plain, decorated);
	}
}
