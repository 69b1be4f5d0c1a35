//! Employee contract.

use super::{FieldSpec, RecordContract, RecordReader};
use crate::cleaners::{FieldKind, Rules};
use crate::models::{ContractType, Employee, EntityKind};

const CONTRACT_TYPES: [&str; 4] = ["Full-time", "Part-time", "Temporary", "Freelance"];

/// Minimum age at termination, counted in 365-day years.
const MIN_YEARS_AT_TERMINATION: i64 = 18;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::required("id", FieldKind::Identifier).aliases(&["employee_id", "emp_id"]),
    FieldSpec::required("name", FieldKind::PersonName).aliases(&["employee_name", "full_name"]),
    FieldSpec::required("email", FieldKind::Email).aliases(&["email_address", "mail"]),
    FieldSpec::required("phone", FieldKind::Phone).aliases(&["phone_number", "telephone"]),
    FieldSpec::optional("department", FieldKind::Text),
    FieldSpec::optional("position", FieldKind::Text).aliases(&["job_title", "title"]),
    FieldSpec::optional("birthdate", FieldKind::Date).aliases(&["birth_date", "date_of_birth"]),
    FieldSpec::optional("hire_date", FieldKind::Date),
    FieldSpec::optional("termination_date", FieldKind::Date).aliases(&["end_date"]),
    FieldSpec::optional("contract_type", FieldKind::Category).aliases(&["contract"]),
    FieldSpec::optional("salary", FieldKind::Decimal),
];

/// Schema of the employee registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmployeeContract;

impl RecordContract for EmployeeContract {
    type Instance = Employee;

    const ENTITY: EntityKind = EntityKind::Employee;

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn build(r: &mut RecordReader<'_>, rules: &Rules) -> Option<Employee> {
        let id = r.identifier("id");
        let name = r.person_name("name", &rules.name);
        let email = r.email("email");
        let phone = r.phone("phone", &rules.phone);
        let birthdate = r.date("birthdate");
        let hire_date = r.date("hire_date");
        let termination_date = r.date("termination_date");
        let contract_type = r.category("contract_type", ContractType::from_label, &CONTRACT_TYPES);
        let salary = r.decimal("salary", true);

        if let (Some(hire), Some(end)) = (hire_date, termination_date) {
            if (end - hire).num_days() < 1 {
                r.inconsistent(
                    "termination_date",
                    format!("termination date {end} is not after hire date {hire}"),
                );
            }
        }
        if let (Some(birth), Some(end)) = (birthdate, termination_date) {
            if (end - birth).num_days() / 365 < MIN_YEARS_AT_TERMINATION {
                r.inconsistent(
                    "termination_date",
                    format!(
                        "termination date {end} is less than {MIN_YEARS_AT_TERMINATION} years after birthdate {birth}"
                    ),
                );
            }
        }

        Some(Employee {
            id: id?,
            name: name?,
            email: email?,
            phone: phone?,
            department: r.text("department"),
            position: r.text("position"),
            birthdate,
            hire_date,
            termination_date,
            contract_type,
            salary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use crate::schema::{validate_record, RejectionReason};
    use chrono::NaiveDate;

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![
            ("id", "E1"),
            ("name", "Mr. John Smith"),
            ("email", "john@corp.com"),
            ("phone", "5551234567"),
        ]
    }

    fn with(extra: &[(&'static str, &'static str)]) -> Record {
        let mut pairs = base();
        for &(k, v) in extra {
            pairs.retain(|(key, _)| *key != k);
            pairs.push((k, v));
        }
        Record::from_pairs(pairs)
    }

    #[test]
    fn test_valid_employee() {
        let record = with(&[
            ("hire_date", "2020-01-01"),
            ("contract_type", "Full-time"),
            ("salary", "52000"),
        ]);
        let employee = validate_record::<EmployeeContract>(&record, &Rules::default()).unwrap();
        assert_eq!(employee.id, "E1");
        assert_eq!(employee.name.display, "Mr. John Smith");
        assert_eq!(employee.name.comparison, "john smith");
        assert_eq!(employee.hire_date, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(employee.contract_type, Some(ContractType::FullTime));
    }

    #[test]
    fn test_all_issues_collected() {
        let record = with(&[
            ("name", ""),
            ("email", "john@@corp"),
            ("phone", "555"),
            ("contract_type", "Intern"),
        ]);
        let rejection = validate_record::<EmployeeContract>(&record, &Rules::default()).unwrap_err();
        assert_eq!(rejection.record_id.as_deref(), Some("E1"));
        let fields: Vec<_> = rejection.issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "email", "phone", "contract_type"]);
        assert_eq!(rejection.issues[0].reason, RejectionReason::MissingField);
        assert_eq!(rejection.issues[1].reason, RejectionReason::InvalidFormat);
    }

    #[test]
    fn test_termination_must_follow_hire() {
        let record = with(&[("hire_date", "2021-05-10"), ("termination_date", "2021-05-10")]);
        let rejection = validate_record::<EmployeeContract>(&record, &Rules::default()).unwrap_err();
        assert!(rejection.has_reason(RejectionReason::InconsistentValue));

        let record = with(&[("hire_date", "2021-05-10"), ("termination_date", "2021-05-11")]);
        assert!(validate_record::<EmployeeContract>(&record, &Rules::default()).is_ok());
    }

    #[test]
    fn test_termination_requires_adult_age() {
        let record = with(&[("birthdate", "2010-01-01"), ("termination_date", "2025-01-01")]);
        let rejection = validate_record::<EmployeeContract>(&record, &Rules::default()).unwrap_err();
        assert_eq!(rejection.issues.len(), 1);
        assert_eq!(rejection.issues[0].field, "termination_date");
    }

    #[test]
    fn test_salary_must_be_positive() {
        let record = with(&[("salary", "0")]);
        let rejection = validate_record::<EmployeeContract>(&record, &Rules::default()).unwrap_err();
        assert_eq!(rejection.issues[0].field, "salary");
    }
}
