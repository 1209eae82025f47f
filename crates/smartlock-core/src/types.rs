use crate::{
    Result,
    constants::{ADMIN_PASSWORD_LEN, CARD_UID_LEN, PIN_CODE_LEN},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use subtle::{Choice, ConstantTimeEq};

/// 4-byte NFC/RFID card UID.
///
/// Two textual forms are used:
/// - decimal, `172:61:255:160` (admin panel listing and delete links)
/// - hex, `AC:3D:FF:A0` (barcode contents)
///
/// A trailing `:` is accepted by both parsers.
///
/// # Security
/// Equality is constant-time since UIDs are compared against the
/// authorization table.
#[derive(Clone, Copy, Eq, Serialize, Deserialize)]
pub struct CardUid([u8; CARD_UID_LEN]);

impl CardUid {
    /// Create a UID from raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; CARD_UID_LEN]) -> Self {
        Self(bytes)
    }

    /// Create a UID from a slice read from a reader or the store.
    ///
    /// # Errors
    /// Returns `Error::InvalidCardUid` unless the slice is exactly 4 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; CARD_UID_LEN] = bytes.try_into().map_err(|_| {
            Error::InvalidCardUid(format!(
                "expected {CARD_UID_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    /// Raw UID bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; CARD_UID_LEN] {
        &self.0
    }

    /// `true` for the all-zero UID (an unset master card slot).
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Parse the decimal form `a:b:c:d`.
    ///
    /// # Errors
    /// Returns `Error::InvalidCardUid` if there are not exactly four segments
    /// or a segment is not a number in 0..=255.
    pub fn parse_decimal(s: &str) -> Result<Self> {
        Self::parse_with(s, 10)
    }

    /// Parse the hex form `AC:3D:FF:A0` (case-insensitive).
    ///
    /// # Errors
    /// Returns `Error::InvalidCardUid` if there are not exactly four segments
    /// or a segment is not one or two hex digits.
    pub fn parse_hex(s: &str) -> Result<Self> {
        Self::parse_with(s, 16)
    }

    fn parse_with(s: &str, radix: u32) -> Result<Self> {
        let trimmed = s.trim();
        let body = trimmed.strip_suffix(':').unwrap_or(trimmed);
        let segments: Vec<&str> = body.split(':').collect();

        if segments.len() != CARD_UID_LEN {
            return Err(Error::InvalidCardUid(format!(
                "expected {CARD_UID_LEN} segments in {s:?}, got {}",
                segments.len()
            )));
        }

        let max_digits = if radix == 16 { 2 } else { 3 };
        let mut bytes = [0u8; CARD_UID_LEN];
        for (slot, segment) in bytes.iter_mut().zip(&segments) {
            if segment.is_empty()
                || segment.len() > max_digits
                || !segment.chars().all(|c| c.is_digit(radix))
            {
                return Err(Error::InvalidCardUid(format!(
                    "invalid segment {segment:?} in {s:?}"
                )));
            }
            *slot = u8::from_str_radix(segment, radix).map_err(|_| {
                Error::InvalidCardUid(format!("segment {segment:?} out of range in {s:?}"))
            })?;
        }

        Ok(Self(bytes))
    }

    /// Hex form with uppercase digits, e.g. `AC:3D:FF:A0`.
    #[must_use]
    pub fn to_hex(&self) -> String {
        let [a, b, c, d] = self.0;
        format!("{a:02X}:{b:02X}:{c:02X}:{d:02X}")
    }
}

impl fmt::Display for CardUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{a}:{b}:{c}:{d}")
    }
}

impl fmt::Debug for CardUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CardUid({})", self.to_hex())
    }
}

impl std::str::FromStr for CardUid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CardUid::parse_decimal(s)
    }
}

impl From<[u8; CARD_UID_LEN]> for CardUid {
    fn from(bytes: [u8; CARD_UID_LEN]) -> Self {
        Self(bytes)
    }
}

impl PartialEq for CardUid {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl std::hash::Hash for CardUid {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// Decode a NUL-padded text field into its string content.
fn field_text(field: &[u8]) -> &[u8] {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    &field[..end]
}

/// Padding hides trailing NULs, so a candidate must also match in length.
fn same_len(stored: &str, candidate: &str) -> Choice {
    (stored.len() as u64).ct_eq(&(candidate.len() as u64))
}

/// Encode a short secret into a fixed-width NUL-padded field.
fn padded<const N: usize>(value: &str) -> [u8; N] {
    let mut field = [0u8; N];
    let len = value.len().min(N);
    field[..len].copy_from_slice(&value.as_bytes()[..len]);
    field
}

/// Keypad PIN code (1-8 digits).
///
/// # Security
/// Verification compares full-width padded fields in constant time, so
/// neither the position of the first mismatch nor the length of the stored
/// code leaks through timing.
#[derive(Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PinCode(String);

impl PinCode {
    /// Create a PIN code with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidPin` if the code is empty, longer than 8
    /// characters or contains anything other than ASCII digits.
    pub fn new(code: &str) -> Result<Self> {
        if code.is_empty() || code.len() > PIN_CODE_LEN {
            return Err(Error::InvalidPin(format!(
                "PIN must be 1-{PIN_CODE_LEN} digits, got {} characters",
                code.len()
            )));
        }
        if !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidPin("PIN must contain only digits".to_string()));
        }
        Ok(Self(code.to_string()))
    }

    /// Decode the stored NUL-padded field.
    ///
    /// Returns `Ok(None)` for an empty field (no PIN configured).
    ///
    /// # Errors
    /// Returns `Error::InvalidPin` if the field holds non-digit bytes.
    pub fn from_field(field: &[u8]) -> Result<Option<Self>> {
        let text = field_text(field);
        if text.is_empty() {
            return Ok(None);
        }
        let code = std::str::from_utf8(text)
            .map_err(|_| Error::InvalidPin("stored PIN is not ASCII".to_string()))?;
        Self::new(code).map(Some)
    }

    /// NUL-padded field as written to persistent memory.
    #[must_use]
    pub fn to_field(&self) -> [u8; PIN_CODE_LEN] {
        padded(&self.0)
    }

    /// Check an entered code against this PIN.
    #[must_use]
    pub fn verify(&self, entered: &str) -> bool {
        if entered.len() > PIN_CODE_LEN {
            return false;
        }
        let expected = self.to_field();
        let candidate: [u8; PIN_CODE_LEN] = padded(entered);
        (expected.ct_eq(&candidate) & same_len(&self.0, entered)).into()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for PinCode {
    fn eq(&self, other: &Self) -> bool {
        self.to_field().ct_eq(&other.to_field()).into()
    }
}

impl fmt::Debug for PinCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PinCode({})", "*".repeat(self.0.len()))
    }
}

impl TryFrom<String> for PinCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        PinCode::new(&value)
    }
}

impl From<PinCode> for String {
    fn from(pin: PinCode) -> String {
        pin.0
    }
}

impl std::str::FromStr for PinCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PinCode::new(s)
    }
}

/// Admin panel password (1-8 printable ASCII characters).
#[derive(Clone, Eq)]
pub struct AdminPassword(String);

impl AdminPassword {
    /// Create an admin password with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidPassword` if the password is empty, longer than
    /// 8 characters or contains non-printable characters.
    pub fn new(password: &str) -> Result<Self> {
        if password.is_empty() || password.len() > ADMIN_PASSWORD_LEN {
            return Err(Error::InvalidPassword(format!(
                "password must be 1-{ADMIN_PASSWORD_LEN} characters, got {}",
                password.len()
            )));
        }
        if !password.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(Error::InvalidPassword(
                "password must be printable ASCII without spaces".to_string(),
            ));
        }
        Ok(Self(password.to_string()))
    }

    /// Decode the stored NUL-padded field.
    ///
    /// # Errors
    /// Returns `Error::InvalidPassword` if the field is empty or invalid.
    pub fn from_field(field: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(field_text(field))
            .map_err(|_| Error::InvalidPassword("stored password is not ASCII".to_string()))?;
        Self::new(text)
    }

    /// NUL-padded field as written to persistent memory.
    #[must_use]
    pub fn to_field(&self) -> [u8; ADMIN_PASSWORD_LEN] {
        padded(&self.0)
    }

    /// Check a submitted password.
    #[must_use]
    pub fn verify(&self, candidate: &str) -> bool {
        if candidate.len() > ADMIN_PASSWORD_LEN {
            return false;
        }
        let len = same_len(&self.0, candidate);
        let candidate: [u8; ADMIN_PASSWORD_LEN] = padded(candidate);
        (self.to_field().ct_eq(&candidate) & len).into()
    }
}

impl PartialEq for AdminPassword {
    fn eq(&self, other: &Self) -> bool {
        self.to_field().ct_eq(&other.to_field()).into()
    }
}

impl fmt::Debug for AdminPassword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("AdminPassword(****)")
    }
}

impl std::str::FromStr for AdminPassword {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AdminPassword::new(s)
    }
}

/// Lockout duration after too many failed attempts, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LockTime(u8);

impl LockTime {
    #[must_use]
    pub const fn from_minutes(minutes: u8) -> Self {
        Self(minutes)
    }

    #[must_use]
    pub fn minutes(&self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.0) * 60)
    }
}

impl fmt::Display for LockTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} min", self.0)
    }
}

/// Parses the admin form value: 1-3 decimal digits fitting in a byte.
impl std::str::FromStr for LockTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.len() > 3 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidLockTime(format!(
                "expected 1-3 digits, got {s:?}"
            )));
        }
        let minutes: u8 = s
            .parse()
            .map_err(|_| Error::InvalidLockTime(format!("{s} exceeds {}", u8::MAX)))?;
        Ok(Self(minutes))
    }
}

/// Input channels that can be switched on and off from the admin panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Nfc,
    Pin,
    Scanner,
}

impl Feature {
    pub const ALL: [Feature; 3] = [Feature::Nfc, Feature::Pin, Feature::Scanner];

    /// Label shown on the admin panel.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Feature::Nfc => "NFC",
            Feature::Pin => "PIN",
            Feature::Scanner => "Scanner",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Feature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nfc" => Ok(Feature::Nfc),
            "pin" => Ok(Feature::Pin),
            "scanner" => Ok(Feature::Scanner),
            _ => Err(Error::UnknownFeature(s.to_string())),
        }
    }
}

/// Kind of credential presented at the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    Card,
    Pin,
    Barcode,
}

impl CredentialKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CredentialKind::Card => "card",
            CredentialKind::Pin => "pin",
            CredentialKind::Barcode => "barcode",
        }
    }

    /// Which feature flag gates this credential.
    #[must_use]
    pub fn feature(self) -> Feature {
        match self {
            CredentialKind::Card => Feature::Nfc,
            CredentialKind::Pin => Feature::Pin,
            CredentialKind::Barcode => Feature::Scanner,
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CredentialKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "card" => Ok(CredentialKind::Card),
            "pin" => Ok(CredentialKind::Pin),
            "barcode" => Ok(CredentialKind::Barcode),
            _ => Err(Error::UnknownFeature(s.to_string())),
        }
    }
}
