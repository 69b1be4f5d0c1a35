//! Cross-dataset consistency checks between employees and sales.
//!
//! All queries are read-only and deterministic: results follow the order of
//! the input collections.

use chrono::NaiveDate;
use rapidfuzz::distance::jaro_winkler;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::models::{Employee, PersonName, Sale};

// =============================================================================
// Name Matching
// =============================================================================

/// How seller names on sales are compared with the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NameMatching {
    /// Jaro-Winkler similarity in `[0, 1]` above which names match.
    /// `None` requires equal comparison forms.
    pub similarity_threshold: Option<f64>,
}

impl NameMatching {
    pub fn exact() -> Self {
        Self::default()
    }

    pub fn fuzzy(threshold: f64) -> Self {
        Self {
            similarity_threshold: Some(threshold),
        }
    }

    pub fn matches(&self, left: &PersonName, right: &PersonName) -> bool {
        if left.comparison == right.comparison {
            return true;
        }
        match self.similarity_threshold {
            Some(threshold) => similarity(left, right) >= threshold,
            None => false,
        }
    }
}

/// Jaro-Winkler similarity of two comparison forms.
pub fn similarity(left: &PersonName, right: &PersonName) -> f64 {
    jaro_winkler::similarity(left.comparison.chars(), right.comparison.chars())
}

// =============================================================================
// Findings
// =============================================================================

/// One relation problem, recomputed on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelationFinding {
    /// Sale references an employee id absent from the registry.
    UnknownEmployeeId { sale_id: String, employee_id: String },
    /// Seller name on the sale differs from the registry name.
    NameMismatch {
        sale_id: String,
        employee_id: String,
        sale_name: String,
        employee_name: String,
    },
    /// Employee never referenced by a sale.
    EmployeeWithoutSales {
        employee_id: String,
        employee_name: String,
    },
    /// Number of employees without sales.
    OrphanEmployeeCount { count: usize },
    /// Sale dated before the seller was hired.
    SaleBeforeHire {
        sale_id: String,
        employee_id: String,
        sale_date: NaiveDate,
        hire_date: NaiveDate,
    },
}

/// Aggregate relation statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationStats {
    pub total_employees: usize,
    pub total_sales: usize,
    pub employees_with_sales: usize,
    pub employees_without_sales: usize,
    pub sales_with_valid_employee: usize,
    pub invalid_employee_ids_in_sales: usize,
    pub invalid_names_in_sales: usize,
    pub sales_before_hire: usize,
}

// =============================================================================
// Validator
// =============================================================================

/// Relation queries over validated employees and sales.
#[derive(Debug, Clone)]
pub struct RelationsValidator<'a> {
    employees: &'a [Employee],
    sales: &'a [Sale],
    by_id: HashMap<&'a str, &'a Employee>,
    matching: NameMatching,
}

impl<'a> RelationsValidator<'a> {
    pub fn new(employees: &'a [Employee], sales: &'a [Sale], matching: NameMatching) -> Self {
        let mut by_id = HashMap::with_capacity(employees.len());
        for employee in employees {
            by_id.entry(employee.id.as_str()).or_insert(employee);
        }
        Self {
            employees,
            sales,
            by_id,
            matching,
        }
    }

    fn employee_for(&self, sale: &Sale) -> Option<&'a Employee> {
        self.by_id.get(sale.employee_id.as_str()).copied()
    }

    /// Sales whose `employee_id` is not a known employee.
    pub fn validate_employee_ids_in_sales(&self) -> Vec<&'a Sale> {
        let unknown: Vec<&'a Sale> = self
            .sales
            .iter()
            .filter(|sale| self.employee_for(sale).is_none())
            .collect();
        debug!(count = unknown.len(), "sales with unknown employee id");
        unknown
    }

    /// Sales whose id matched but whose seller name does not.
    ///
    /// Sales with an unknown employee id are excluded.
    pub fn validate_employee_names_in_sales(&self) -> Vec<&'a Sale> {
        let mismatched: Vec<&'a Sale> = self
            .sales
            .iter()
            .filter(|sale| {
                self.employee_for(sale)
                    .is_some_and(|employee| !self.matching.matches(&sale.employee_name, &employee.name))
            })
            .collect();
        debug!(count = mismatched.len(), "sales with mismatched seller name");
        mismatched
    }

    /// Employees never referenced by any sale.
    pub fn validate_employee_without_sales(&self) -> Vec<&'a Employee> {
        let referenced: HashSet<&str> = self.sales.iter().map(|s| s.employee_id.as_str()).collect();
        let orphans: Vec<&'a Employee> = self
            .employees
            .iter()
            .filter(|employee| !referenced.contains(employee.id.as_str()))
            .collect();
        debug!(count = orphans.len(), "employees without sales");
        orphans
    }

    /// Number of employees never referenced by any sale.
    pub fn validate_count_employees_without_sales(&self) -> usize {
        self.validate_employee_without_sales().len()
    }

    /// Sales dated before the matched employee's hire date.
    pub fn validate_sales_before_hire(&self) -> Vec<&'a Sale> {
        self.sales
            .iter()
            .filter(|sale| {
                self.employee_for(sale)
                    .and_then(|employee| employee.hire_date)
                    .is_some_and(|hired| sale.date < hired)
            })
            .collect()
    }

    pub fn summary(&self) -> RelationStats {
        let without_sales = self.validate_count_employees_without_sales();
        let unknown_ids = self.validate_employee_ids_in_sales().len();
        let stats = RelationStats {
            total_employees: self.employees.len(),
            total_sales: self.sales.len(),
            employees_with_sales: self.employees.len() - without_sales,
            employees_without_sales: without_sales,
            sales_with_valid_employee: self.sales.len() - unknown_ids,
            invalid_employee_ids_in_sales: unknown_ids,
            invalid_names_in_sales: self.validate_employee_names_in_sales().len(),
            sales_before_hire: self.validate_sales_before_hire().len(),
        };
        info!(
            unknown_ids = stats.invalid_employee_ids_in_sales,
            name_mismatches = stats.invalid_names_in_sales,
            orphans = stats.employees_without_sales,
            "relations checked"
        );
        stats
    }

    /// Every finding, grouped by kind in a fixed order.
    pub fn findings(&self) -> Vec<RelationFinding> {
        let mut findings = Vec::new();

        for sale in self.validate_employee_ids_in_sales() {
            findings.push(RelationFinding::UnknownEmployeeId {
                sale_id: sale.id.clone(),
                employee_id: sale.employee_id.clone(),
            });
        }

        for sale in self.validate_employee_names_in_sales() {
            if let Some(employee) = self.employee_for(sale) {
                findings.push(RelationFinding::NameMismatch {
                    sale_id: sale.id.clone(),
                    employee_id: sale.employee_id.clone(),
                    sale_name: sale.employee_name.display.clone(),
                    employee_name: employee.name.display.clone(),
                });
            }
        }

        let orphans = self.validate_employee_without_sales();
        let count = orphans.len();
        for employee in orphans {
            findings.push(RelationFinding::EmployeeWithoutSales {
                employee_id: employee.id.clone(),
                employee_name: employee.name.display.clone(),
            });
        }
        findings.push(RelationFinding::OrphanEmployeeCount { count });

        for sale in self.validate_sales_before_hire() {
            if let Some(hire_date) = self.employee_for(sale).and_then(|e| e.hire_date) {
                findings.push(RelationFinding::SaleBeforeHire {
                    sale_id: sale.id.clone(),
                    employee_id: sale.employee_id.clone(),
                    sale_date: sale.date,
                    hire_date,
                });
            }
        }

        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaners::name::{self, NameRules};

    fn person(raw: &str) -> PersonName {
        name::clean(raw, &NameRules::default()).unwrap()
    }

    fn employee(id: &str, name: &str) -> Employee {
        Employee {
            id: id.to_string(),
            name: person(name),
            email: format!("{}@corp.com", id.to_lowercase()),
            phone: "5551234567".to_string(),
            department: None,
            position: None,
            birthdate: None,
            hire_date: None,
            termination_date: None,
            contract_type: None,
            salary: None,
        }
    }

    fn sale(id: &str, employee_id: &str, name: &str) -> Sale {
        Sale {
            id: id.to_string(),
            employee_id: employee_id.to_string(),
            employee_name: person(name),
            amount: 10.0,
            date: NaiveDate::from_ymd_opt(2023, 1, 15).unwrap(),
            product_id: None,
            buyer_name: None,
            quantity: None,
            unit_price: None,
            status: None,
        }
    }

    fn ids<T>(items: &[&T], id: impl Fn(&T) -> &str) -> Vec<String> {
        items.iter().map(|item| id(item).to_string()).collect()
    }

    #[test]
    fn test_honorific_and_spacing_do_not_cause_mismatch() {
        let employees = vec![employee("E1", "Mr. John Smith")];
        let sales = vec![sale("S1", "E1", "john   smith")];
        let validator = RelationsValidator::new(&employees, &sales, NameMatching::exact());

        assert!(validator.validate_employee_ids_in_sales().is_empty());
        assert!(validator.validate_employee_names_in_sales().is_empty());
        assert_eq!(validator.validate_count_employees_without_sales(), 0);
    }

    #[test]
    fn test_unknown_id_excluded_from_name_mismatches() {
        let employees: Vec<Employee> = Vec::new();
        let sales = vec![sale("S2", "E9", "Jane Doe")];
        let validator = RelationsValidator::new(&employees, &sales, NameMatching::exact());

        let unknown = validator.validate_employee_ids_in_sales();
        assert_eq!(ids(&unknown, |s: &Sale| s.id.as_str()), vec!["S2"]);
        assert!(validator.validate_employee_names_in_sales().is_empty());
    }

    #[test]
    fn test_id_and_name_mismatch_sets_are_disjoint() {
        let employees = vec![employee("E1", "Ann Lee"), employee("E2", "Bob Ray")];
        let sales = vec![
            sale("S1", "E1", "Ann Lee"),
            sale("S2", "E2", "Robert Ray"),
            sale("S3", "E3", "Cid Poe"),
            sale("S4", "E4", "Ann Lee"),
        ];
        let validator = RelationsValidator::new(&employees, &sales, NameMatching::exact());

        let by_id: HashSet<&str> = validator
            .validate_employee_ids_in_sales()
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        let by_name: HashSet<&str> = validator
            .validate_employee_names_in_sales()
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(by_id, HashSet::from(["S3", "S4"]));
        assert_eq!(by_name, HashSet::from(["S2"]));
        assert!(by_id.is_disjoint(&by_name));
    }

    #[test]
    fn test_no_employees_means_every_sale_unknown() {
        let employees: Vec<Employee> = Vec::new();
        let sales = vec![sale("S1", "E1", "A B"), sale("S2", "E2", "C D")];
        let validator = RelationsValidator::new(&employees, &sales, NameMatching::exact());
        assert_eq!(validator.validate_employee_ids_in_sales().len(), sales.len());
        assert_eq!(validator.validate_count_employees_without_sales(), 0);
    }

    #[test]
    fn test_no_sales_means_every_employee_orphaned() {
        let employees = vec![employee("E1", "Ann Lee"), employee("E2", "Bob Ray")];
        let sales: Vec<Sale> = Vec::new();
        let validator = RelationsValidator::new(&employees, &sales, NameMatching::exact());

        let orphans = validator.validate_employee_without_sales();
        assert_eq!(ids(&orphans, |e: &Employee| e.id.as_str()), vec!["E1", "E2"]);
        assert_eq!(validator.validate_count_employees_without_sales(), employees.len());
    }

    #[test]
    fn test_count_matches_orphan_list() {
        let employees = vec![
            employee("E1", "Ann Lee"),
            employee("E2", "Bob Ray"),
            employee("E3", "Cid Poe"),
        ];
        let sales = vec![sale("S1", "E2", "Bob Ray"), sale("S2", "E2", "Bob Ray")];
        let validator = RelationsValidator::new(&employees, &sales, NameMatching::exact());
        assert_eq!(
            validator.validate_count_employees_without_sales(),
            validator.validate_employee_without_sales().len()
        );
        assert_eq!(validator.validate_count_employees_without_sales(), 2);
    }

    #[test]
    fn test_queries_are_deterministic() {
        let employees = vec![employee("E1", "Ann Lee"), employee("E2", "Bob Ray")];
        let sales = vec![sale("S1", "E9", "X Y"), sale("S2", "E1", "Anne Lee")];
        let first = RelationsValidator::new(&employees, &sales, NameMatching::exact());
        let second = RelationsValidator::new(&employees, &sales, NameMatching::exact());
        assert_eq!(first.findings(), second.findings());
        assert_eq!(first.findings(), first.findings());
        assert_eq!(first.summary(), second.summary());
    }

    #[test]
    fn test_fuzzy_threshold_relaxes_name_check() {
        let employees = vec![employee("E1", "Ann Lee")];
        let sales = vec![sale("S1", "E1", "Anne Lee")];

        let exact = RelationsValidator::new(&employees, &sales, NameMatching::exact());
        assert_eq!(exact.validate_employee_names_in_sales().len(), 1);

        let fuzzy = RelationsValidator::new(&employees, &sales, NameMatching::fuzzy(0.9));
        assert!(fuzzy.validate_employee_names_in_sales().is_empty());
    }

    #[test]
    fn test_sales_before_hire() {
        let mut hired = employee("E1", "Ann Lee");
        hired.hire_date = NaiveDate::from_ymd_opt(2023, 2, 1);
        let employees = vec![hired];
        let sales = vec![sale("S1", "E1", "Ann Lee")];
        let validator = RelationsValidator::new(&employees, &sales, NameMatching::exact());

        assert_eq!(validator.validate_sales_before_hire().len(), 1);
        let findings = validator.findings();
        assert!(matches!(
            findings.last(),
            Some(RelationFinding::SaleBeforeHire { sale_id, .. }) if sale_id == "S1"
        ));
    }

    #[test]
    fn test_summary_and_finding_serialization() {
        let employees = vec![employee("E1", "Ann Lee"), employee("E2", "Bob Ray")];
        let sales = vec![sale("S1", "E1", "Ann Lee"), sale("S2", "E7", "Zed")];
        let validator = RelationsValidator::new(&employees, &sales, NameMatching::exact());

        let stats = validator.summary();
        assert_eq!(stats.employees_with_sales, 1);
        assert_eq!(stats.employees_without_sales, 1);
        assert_eq!(stats.sales_with_valid_employee, 1);
        assert_eq!(stats.invalid_employee_ids_in_sales, 1);

        let json = serde_json::to_value(validator.findings()).unwrap();
        assert_eq!(json[0]["kind"], "unknown_employee_id");
        assert_eq!(json[0]["sale_id"], "S2");
        assert_eq!(json[2]["kind"], "orphan_employee_count");
        assert_eq!(json[2]["count"], 1);
    }
}
