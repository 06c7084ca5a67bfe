//! Domain entities: identities and flat relation rows

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, DomainResult};

/// Surrogate key of an employee. Names are display attributes only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub u64);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl FromStr for EmployeeId {
    type Err = std::num::ParseIntError;

    /// Accepts `42` as well as the display form `#42`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        s.strip_prefix('#').unwrap_or(s).parse().map(EmployeeId)
    }
}

/// First and last name of a person.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersonName {
    pub first: String,
    pub last: String,
}

impl PersonName {
    pub fn new(first: impl Into<String>, last: impl Into<String>) -> Self {
        Self {
            first: first.into().trim().to_string(),
            last: last.into().trim().to_string(),
        }
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first, self.last)
    }
}

/// Organizational division. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Division {
    Global,
    Domestic,
}

impl Division {
    pub const ALL: [Division; 2] = [Division::Global, Division::Domestic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Division::Global => "global",
            Division::Domestic => "domestic",
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Division {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(Division::Global),
            "domestic" => Ok(Division::Domestic),
            _ => Err(DomainError::UnknownDivision(s.to_string())),
        }
    }
}

/// Reference to a parent node, either by surrogate key or by name pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParentRef {
    Id(EmployeeId),
    Name(PersonName),
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentRef::Id(id) => write!(f, "{}", id),
            ParentRef::Name(name) => write!(f, "{}", name),
        }
    }
}

impl From<EmployeeId> for ParentRef {
    fn from(id: EmployeeId) -> Self {
        ParentRef::Id(id)
    }
}

impl From<PersonName> for ParentRef {
    fn from(name: PersonName) -> Self {
        ParentRef::Name(name)
    }
}

/// One row of the flat employee/supervisor relation.
///
/// The relation encodes the hierarchy through a single parent pointer per
/// row. `supervisor_id` wins when present; otherwise the supervisor name pair
/// is used (division variant).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRow {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor_id: Option<EmployeeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor_first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor_last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division: Option<Division>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_effective_date: Option<NaiveDate>,
    #[serde(default)]
    pub raise_eligible: bool,
    /// Columns owned by other consumers of the relation, kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FlatRow {
    /// Row for a top-level employee.
    pub fn root(id: u64, first_name: &str, last_name: &str) -> Self {
        Self {
            id: EmployeeId(id),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            supervisor_id: None,
            supervisor_first_name: None,
            supervisor_last_name: None,
            division: None,
            title: None,
            salary_effective_date: None,
            raise_eligible: false,
            extra: serde_json::Map::new(),
        }
    }

    /// Row reporting to `supervisor` by id.
    pub fn reporting_to(id: u64, first_name: &str, last_name: &str, supervisor: u64) -> Self {
        Self {
            supervisor_id: Some(EmployeeId(supervisor)),
            ..Self::root(id, first_name, last_name)
        }
    }

    pub fn with_division(mut self, division: Division) -> Self {
        self.division = Some(division);
        self
    }

    pub fn with_supervisor_name(mut self, first: &str, last: &str) -> Self {
        self.supervisor_first_name = Some(first.to_string());
        self.supervisor_last_name = Some(last.to_string());
        self
    }

    pub fn name(&self) -> PersonName {
        PersonName::new(&self.first_name, &self.last_name)
    }

    /// Parent reference encoded by this row, if any.
    pub fn parent_ref(&self) -> DomainResult<Option<ParentRef>> {
        if let Some(id) = self.supervisor_id {
            return Ok(Some(ParentRef::Id(id)));
        }
        let first = non_blank(self.supervisor_first_name.as_deref());
        let last = non_blank(self.supervisor_last_name.as_deref());
        match (first, last) {
            (None, None) => Ok(None),
            (Some(first), Some(last)) => Ok(Some(ParentRef::Name(PersonName::new(first, last)))),
            _ => Err(DomainError::MalformedRow {
                id: self.id,
                message: "supervisor name needs both first and last name".to_string(),
            }),
        }
    }

    /// Point this row at a new supervisor, keeping id and name pair in sync.
    pub fn set_supervisor(&mut self, supervisor: Option<(EmployeeId, &PersonName)>) {
        match supervisor {
            Some((id, name)) => {
                self.supervisor_id = Some(id);
                self.supervisor_first_name = Some(name.first.clone());
                self.supervisor_last_name = Some(name.last.clone());
            }
            None => {
                self.supervisor_id = None;
                self.supervisor_first_name = None;
                self.supervisor_last_name = None;
            }
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_display_form_when_parsing_id_then_strips_hash() {
        assert_eq!("#42".parse::<EmployeeId>().unwrap(), EmployeeId(42));
        assert_eq!(" 7 ".parse::<EmployeeId>().unwrap(), EmployeeId(7));
        assert!("seven".parse::<EmployeeId>().is_err());
    }

    #[test]
    fn given_mixed_case_when_parsing_division_then_accepts() {
        assert_eq!("Global".parse::<Division>().unwrap(), Division::Global);
        assert_eq!("DOMESTIC".parse::<Division>().unwrap(), Division::Domestic);
        assert_eq!(
            "regional".parse::<Division>(),
            Err(DomainError::UnknownDivision("regional".to_string()))
        );
    }

    #[test]
    fn given_id_and_name_when_resolving_parent_ref_then_id_wins() {
        let row = FlatRow::reporting_to(2, "Ann", "Lee", 1).with_supervisor_name("Bob", "Ray");
        assert_eq!(row.parent_ref().unwrap(), Some(ParentRef::Id(EmployeeId(1))));
    }

    #[test]
    fn given_only_name_pair_when_resolving_parent_ref_then_returns_name() {
        let row = FlatRow::root(2, "Ann", "Lee").with_supervisor_name(" Bob ", "Ray");
        assert_eq!(
            row.parent_ref().unwrap(),
            Some(ParentRef::Name(PersonName::new("Bob", "Ray")))
        );
    }

    #[test]
    fn given_half_a_name_when_resolving_parent_ref_then_malformed() {
        let mut row = FlatRow::root(2, "Ann", "Lee");
        row.supervisor_first_name = Some("Bob".to_string());
        assert!(matches!(
            row.parent_ref(),
            Err(DomainError::MalformedRow { .. })
        ));
    }

    #[test]
    fn given_blank_name_pair_when_resolving_parent_ref_then_root() {
        let row = FlatRow::root(2, "Ann", "Lee").with_supervisor_name("", "  ");
        assert_eq!(row.parent_ref().unwrap(), None);
    }
}
