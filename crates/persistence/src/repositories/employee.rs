//! Employee repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{EmployeeEntity, EmployeeViewEntity};
use crate::metrics::QueryTimer;

use super::like_pattern;

const EMPLOYEE_COLUMNS: &str = "id, company_id, employee_code, full_name, designation, card_no, \
                                is_active, created_at, updated_at";

const EMPLOYEE_VIEW_SELECT: &str = r#"
    SELECT e.id, e.company_id, e.employee_code, e.full_name, e.designation, e.card_no,
           e.is_active, e.created_at, e.updated_at,
           c.code AS company_code, c.name AS company_name
    FROM employees e
    JOIN sync_companies c ON c.id = e.company_id
"#;

#[derive(Debug, Clone)]
pub struct NewEmployee<'a> {
    pub company_id: Uuid,
    pub employee_code: &'a str,
    pub full_name: &'a str,
    pub designation: Option<&'a str>,
    pub card_no: Option<&'a str>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct EmployeeChanges<'a> {
    pub company_id: Option<Uuid>,
    pub employee_code: Option<&'a str>,
    pub full_name: Option<&'a str>,
    pub designation: Option<&'a str>,
    pub card_no: Option<&'a str>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct EmployeeFilter<'a> {
    pub search: Option<&'a str>,
    pub is_active: Option<bool>,
    pub company_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, employee: NewEmployee<'_>) -> Result<EmployeeEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_employee");
        let result = sqlx::query_as::<_, EmployeeEntity>(&format!(
            r#"
            INSERT INTO employees (company_id, employee_code, full_name, designation, card_no, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        ))
        .bind(employee.company_id)
        .bind(employee.employee_code)
        .bind(employee.full_name)
        .bind(employee.designation)
        .bind(employee.card_no)
        .bind(employee.is_active)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_view_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<EmployeeViewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_employee_by_id");
        let result = sqlx::query_as::<_, EmployeeViewEntity>(&format!(
            "{} WHERE e.id = $1",
            EMPLOYEE_VIEW_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn update(
        &self,
        id: Uuid,
        changes: EmployeeChanges<'_>,
    ) -> Result<Option<EmployeeEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_employee");
        let result = sqlx::query_as::<_, EmployeeEntity>(&format!(
            r#"
            UPDATE employees
            SET company_id = COALESCE($2, company_id),
                employee_code = COALESCE($3, employee_code),
                full_name = COALESCE($4, full_name),
                designation = COALESCE($5, designation),
                card_no = COALESCE($6, card_no),
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        ))
        .bind(id)
        .bind(changes.company_id)
        .bind(changes.employee_code)
        .bind(changes.full_name)
        .bind(changes.designation)
        .bind(changes.card_no)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn toggle_status(&self, id: Uuid) -> Result<Option<bool>, sqlx::Error> {
        super::toggle_active(&self.pool, "employees", id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        super::delete_by_id(&self.pool, "employees", id).await
    }

    pub async fn list(
        &self,
        filter: &EmployeeFilter<'_>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<EmployeeViewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_employees");
        let result = sqlx::query_as::<_, EmployeeViewEntity>(&format!(
            r#"
            {}
            WHERE ($1::text IS NULL OR e.employee_code ILIKE $1 OR e.full_name ILIKE $1
                   OR e.card_no ILIKE $1)
              AND ($2::bool IS NULL OR e.is_active = $2)
              AND ($3::uuid IS NULL OR e.company_id = $3)
            ORDER BY c.code, e.employee_code
            LIMIT $4 OFFSET $5
            "#,
            EMPLOYEE_VIEW_SELECT
        ))
        .bind(like_pattern(filter.search))
        .bind(filter.is_active)
        .bind(filter.company_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn count(&self, filter: &EmployeeFilter<'_>) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_employees");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM employees e
            WHERE ($1::text IS NULL OR e.employee_code ILIKE $1 OR e.full_name ILIKE $1
                   OR e.card_no ILIKE $1)
              AND ($2::bool IS NULL OR e.is_active = $2)
              AND ($3::uuid IS NULL OR e.company_id = $3)
            "#,
        )
        .bind(like_pattern(filter.search))
        .bind(filter.is_active)
        .bind(filter.company_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
