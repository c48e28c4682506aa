//! Exhaustive option validation.
//!
//! Rules are collected per field and reported together; nothing fails fast.
//! The combined message lists fields in alphabetical order, so two runs over
//! the same options always produce the same text.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;
use crate::stack;

/// Implemented by every request options struct.
pub trait Validate {
    fn validate(&self) -> Result<(), Error>;
}

static DNS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z0-9]([-a-z0-9]{0,61}[a-z0-9])?\.)+[a-z]{2,63}\.?$").expect("static regex")
});

static K8S_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("static regex"));

static CIDR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})/(\d{1,2})$").expect("static regex")
});

/// Collects field violations.
#[derive(Debug, Default)]
pub struct Validator {
    errors: BTreeMap<String, Vec<String>>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation for `field`.
    pub fn fail(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
        self
    }

    /// Record a violation when `ok` is false.
    pub fn check(&mut self, field: &str, ok: bool, message: &str) -> &mut Self {
        if !ok {
            self.fail(field, message);
        }
        self
    }

    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(field, !value.trim().is_empty(), "cannot be blank")
    }

    /// Required and at most `max` characters.
    pub fn required_max(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if value.trim().is_empty() {
            return self.fail(field, "cannot be blank");
        }
        self.check(
            field,
            value.chars().count() <= max,
            &format!("the length must be no more than {max}"),
        )
    }

    /// Required and between `min` and `max` characters.
    pub fn required_len(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        if value.trim().is_empty() {
            return self.fail(field, "cannot be blank");
        }
        let len = value.chars().count();
        self.check(
            field,
            (min..=max).contains(&len),
            &format!("the length must be between {min} and {max}"),
        )
    }

    pub fn required_match(
        &mut self,
        field: &str,
        value: &str,
        re: &Regex,
        message: &str,
    ) -> &mut Self {
        if value.trim().is_empty() {
            return self.fail(field, "cannot be blank");
        }
        self.check(field, re.is_match(value), message)
    }

    pub fn dns_name(&mut self, field: &str, value: &str) -> &mut Self {
        self.required_match(field, value, &DNS_NAME, "must be a valid domain name")
    }

    pub fn k8s_name(&mut self, field: &str, value: &str) -> &mut Self {
        if value.chars().count() > 63 {
            return self.fail(field, "the length must be no more than 63");
        }
        self.required_match(field, value, &K8S_NAME, "must be a valid kubernetes name")
    }

    /// A derived CloudFormation stack name fits the provider's limit.
    pub fn stack_name(&mut self, field: &str, value: &str) -> &mut Self {
        self.required_max(field, value, stack::MAX_NAME_LEN)
    }

    pub fn cidr(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            return self.fail(field, "cannot be blank");
        }
        self.check(field, is_cidr(value), "must be a valid IPv4 CIDR block")
    }

    pub fn arn(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            return self.fail(field, "cannot be blank");
        }
        self.check(field, value.starts_with("arn:"), "must be a valid ARN")
    }

    pub fn semver(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            return self.fail(field, "cannot be blank");
        }
        let ok = semver::Version::parse(value.trim_start_matches('v')).is_ok();
        self.check(field, ok, "must be a valid semantic version")
    }

    /// Validate a nested value and record its violations under `prefix.`.
    pub fn nested<V: Validate>(&mut self, prefix: &str, value: &V) -> &mut Self {
        if let Err(e) = value.validate() {
            self.fail(prefix, format!("({})", e.message()));
        }
        self
    }

    /// Merge the violations of another validator unchanged.
    pub fn merge(&mut self, other: Validator) -> &mut Self {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Field names with violations, alphabetically.
    pub fn fields(&self) -> Vec<&str> {
        self.errors.keys().map(String::as_str).collect()
    }

    /// `Ok(())` when no violation was recorded, otherwise one `Invalid`
    /// error enumerating every field.
    pub fn finish(self) -> Result<(), Error> {
        if self.errors.is_empty() {
            return Ok(());
        }
        let message = self
            .errors
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");
        let mut err = Error::invalid(message);
        for (field, messages) in self.errors {
            err = err.with_detail(field, messages.join(", "));
        }
        Err(err)
    }
}

fn is_cidr(value: &str) -> bool {
    let Some(caps) = CIDR.captures(value) else {
        return false;
    };
    let octets_ok = (1..=4).all(|i| caps[i].parse::<u16>().is_ok_and(|o| o <= 255));
    let prefix_ok = caps[5].parse::<u8>().is_ok_and(|p| p <= 32);
    octets_ok && prefix_ok
}
