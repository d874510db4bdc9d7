use std::collections::HashMap;
use std::future::Future;

use sqlx::PgPool;
use uuid::Uuid;

use crate::database::retry;
use crate::dto::analytics_dto::{
    CompanyDashboard, Geography, InterviewStats, JobSummary, LabelCount, MonthCount, Overview,
    ReviewStats, SkillDemand, StudentDashboard, Trends, Widget,
};
use crate::error::Result;
use crate::models::internship::InternAssignment;
use crate::services::company_service::CompanyService;
use crate::services::internship_service::ASSIGNMENT_SELECT;
use crate::services::job_service::JobService;
use crate::services::student_service::StudentService;
use crate::utils::time::{today, trailing_month_keys, window_start};

const TREND_MONTHS: u32 = 12;
const DEFAULT_SKILLS: i64 = 10;
const MAX_SKILLS: i64 = 50;

/// Read-only aggregates behind the dashboard endpoints.
#[derive(Clone)]
pub struct AnalyticsService {
    pool: PgPool,
    students: StudentService,
    companies: CompanyService,
    jobs: JobService,
}

async fn widget<T>(name: &'static str, query: impl Future<Output = Result<T>>) -> Widget<T> {
    match query.await {
        Ok(data) => Widget::Ok { data },
        Err(e) => {
            tracing::error!(widget = name, error = %e, "dashboard widget failed");
            Widget::Error {
                message: format!("Failed to load {}", name),
            }
        }
    }
}

/// Zero-fills `rows` (keyed `YYYY-MM`) over `keys`, keeping the key order.
pub fn fill_months(keys: &[String], rows: &[LabelCount]) -> Vec<MonthCount> {
    let counts: HashMap<&str, i64> = rows.iter().map(|r| (r.label.as_str(), r.count)).collect();
    keys.iter()
        .map(|k| MonthCount {
            month: k.clone(),
            count: counts.get(k.as_str()).copied().unwrap_or(0),
        })
        .collect()
}

/// Students holding a skill per job asking for it; undefined without demand.
pub fn supply_ratio(demand: i64, supply: i64) -> Option<f64> {
    if demand <= 0 {
        None
    } else {
        Some(((supply as f64 / demand as f64) * 100.0).round() / 100.0)
    }
}

impl AnalyticsService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            students: StudentService::new(pool.clone()),
            companies: CompanyService::new(pool.clone()),
            jobs: JobService::new(pool.clone()),
            pool,
        }
    }

    async fn counts(&self, sql: &str) -> Result<Vec<LabelCount>> {
        let pool = &self.pool;
        let rows = retry::read(|| async move {
            sqlx::query_as::<_, LabelCount>(sql).fetch_all(pool).await
        })
        .await?;
        Ok(rows)
    }

    async fn counts_for(&self, sql: &str, id: Uuid) -> Result<Vec<LabelCount>> {
        let pool = &self.pool;
        let rows = retry::read(|| async move {
            sqlx::query_as::<_, LabelCount>(sql).bind(id).fetch_all(pool).await
        })
        .await?;
        Ok(rows)
    }

    async fn count(&self, sql: &str) -> Result<i64> {
        let pool = &self.pool;
        let n = retry::read(|| async move {
            sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await
        })
        .await?;
        Ok(n)
    }

    async fn count_for(&self, sql: &str, id: Uuid) -> Result<i64> {
        let pool = &self.pool;
        let n = retry::read(|| async move {
            sqlx::query_scalar::<_, i64>(sql).bind(id).fetch_one(pool).await
        })
        .await?;
        Ok(n)
    }

    async fn interview_stats(&self, scope: &str, id: Uuid) -> Result<InterviewStats> {
        let sql = format!(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE i.status = 'Completed') AS completed,
                   COUNT(*) FILTER (WHERE i.status = 'Scheduled' AND i.scheduled_at > NOW()) AS upcoming,
                   AVG(i.score)::float8 AS average_score
            FROM interviews i
            JOIN applications a ON a.id = i.application_id
            WHERE {} = $1
            "#,
            scope
        );
        let sql = &sql;
        let pool = &self.pool;
        let stats = retry::read(|| async move {
            sqlx::query_as::<_, InterviewStats>(sql).bind(id).fetch_one(pool).await
        })
        .await?;
        Ok(stats)
    }

    async fn monthly(&self, table: &str, column: &str) -> Result<Vec<MonthCount>> {
        let end = today();
        let keys = trailing_month_keys(end, TREND_MONTHS);
        let sql = format!(
            "SELECT to_char(date_trunc('month', {col}), 'YYYY-MM') AS label, COUNT(*) AS count \
             FROM {table} WHERE {col} >= $1 GROUP BY 1",
            col = column,
            table = table
        );
        let sql = &sql;
        let pool = &self.pool;
        let since = window_start(end, TREND_MONTHS);
        let rows = retry::read(|| async move {
            sqlx::query_as::<_, LabelCount>(sql).bind(since).fetch_all(pool).await
        })
        .await?;
        Ok(fill_months(&keys, &rows))
    }

    pub async fn overview(&self) -> Overview {
        let (students, companies, jobs, applications, interviews, assignments) = tokio::join!(
            widget(
                "students_by_status",
                self.counts("SELECT status AS label, COUNT(*) AS count FROM students GROUP BY status ORDER BY status"),
            ),
            widget(
                "active_companies",
                self.count("SELECT COUNT(*) FROM companies WHERE is_active"),
            ),
            widget(
                "jobs_by_status",
                self.counts("SELECT status AS label, COUNT(*) AS count FROM jobs GROUP BY status ORDER BY status"),
            ),
            widget(
                "applications_by_status",
                self.counts("SELECT status AS label, COUNT(*) AS count FROM applications GROUP BY status ORDER BY status"),
            ),
            widget(
                "upcoming_interviews",
                self.count(
                    "SELECT COUNT(*) FROM interviews WHERE status = 'Scheduled' \
                     AND scheduled_at BETWEEN NOW() AND NOW() + INTERVAL '7 days'",
                ),
            ),
            widget(
                "active_assignments",
                self.count("SELECT COUNT(*) FROM intern_assignments WHERE status = 'Assigned'"),
            ),
        );
        Overview {
            students_by_status: students,
            active_companies: companies,
            jobs_by_status: jobs,
            applications_by_status: applications,
            upcoming_interviews: interviews,
            active_assignments: assignments,
        }
    }

    pub async fn trends(&self) -> Trends {
        let (applications, students) = tokio::join!(
            widget("applications", self.monthly("applications", "application_date")),
            widget("students", self.monthly("students", "created_at")),
        );
        Trends {
            applications,
            students,
        }
    }

    pub async fn geography(&self) -> Geography {
        let (students, jobs) = tokio::join!(
            widget(
                "students_by_city",
                self.counts(
                    "SELECT COALESCE(NULLIF(TRIM(city), ''), 'Unknown') AS label, COUNT(*) AS count \
                     FROM students GROUP BY 1 ORDER BY count DESC, label",
                ),
            ),
            widget(
                "jobs_by_location",
                self.counts(
                    "SELECT COALESCE(NULLIF(TRIM(location), ''), 'Unknown') AS label, COUNT(*) AS count \
                     FROM jobs WHERE status = 'Active' GROUP BY 1 ORDER BY count DESC, label",
                ),
            ),
        );
        Geography {
            students_by_city: students,
            jobs_by_location: jobs,
        }
    }

    /// Demand counts skill links on Active jobs; supply counts students with the skill.
    pub async fn skills(&self, limit: Option<i64>) -> Result<Vec<SkillDemand>> {
        let limit = limit.unwrap_or(DEFAULT_SKILLS).clamp(1, MAX_SKILLS);
        let pool = &self.pool;
        let rows = retry::read(|| async move {
            sqlx::query_as::<_, (Uuid, String, String, i64, i64)>(
                r#"
                SELECT s.id, s.name, s.category,
                       (SELECT COUNT(*) FROM job_skills js JOIN jobs j ON j.id = js.job_id
                         WHERE js.skill_id = s.id AND j.status = 'Active') AS demand,
                       (SELECT COUNT(*) FROM student_skills ss WHERE ss.skill_id = s.id) AS supply
                FROM skills s
                ORDER BY demand DESC, supply DESC, s.name
                LIMIT $1
                "#,
            )
            .bind(limit)
            .fetch_all(pool)
            .await
        })
        .await?;

        Ok(rows
            .into_iter()
            .map(|(skill_id, name, category, demand, supply)| SkillDemand {
                skill_id,
                name,
                category,
                demand,
                supply,
                ratio: supply_ratio(demand, supply),
            })
            .collect())
    }

    async fn active_assignment(&self, student_id: Uuid) -> Result<Option<InternAssignment>> {
        let sql = format!("{} WHERE x.student_id = $1 AND x.status = 'Assigned'", ASSIGNMENT_SELECT);
        let sql = &sql;
        let pool = &self.pool;
        let row = retry::read(|| async move {
            sqlx::query_as::<_, InternAssignment>(sql)
                .bind(student_id)
                .fetch_optional(pool)
                .await
        })
        .await?;
        Ok(row)
    }

    pub async fn student_dashboard(&self, id: Uuid) -> Result<StudentDashboard> {
        let student = self.students.get_by_id(id).await?;
        let (applications, interviews, skills, unread, assignment) = tokio::join!(
            widget(
                "applications_by_status",
                self.counts_for(
                    "SELECT status AS label, COUNT(*) AS count FROM applications \
                     WHERE student_id = $1 GROUP BY status ORDER BY status",
                    id,
                ),
            ),
            widget("interviews", self.interview_stats("i.student_id", id)),
            widget(
                "skills",
                self.count_for("SELECT COUNT(*) FROM student_skills WHERE student_id = $1", id),
            ),
            widget(
                "unread_notifications",
                self.count_for(
                    "SELECT COUNT(*) FROM notifications WHERE student_id = $1 AND NOT is_read",
                    id,
                ),
            ),
            widget("active_assignment", self.active_assignment(id)),
        );
        Ok(StudentDashboard {
            student,
            applications_by_status: applications,
            interviews,
            skills,
            unread_notifications: unread,
            active_assignment: assignment,
        })
    }

    pub async fn company_dashboard(&self, id: Uuid) -> Result<CompanyDashboard> {
        let company = self.companies.get_by_id(id).await?;
        let (jobs, applications, reviews, interns) = tokio::join!(
            widget(
                "jobs_by_status",
                self.counts_for(
                    "SELECT status AS label, COUNT(*) AS count FROM jobs \
                     WHERE company_id = $1 GROUP BY status ORDER BY status",
                    id,
                ),
            ),
            widget(
                "applications_by_status",
                self.counts_for(
                    "SELECT a.status AS label, COUNT(*) AS count FROM applications a \
                     JOIN jobs j ON j.id = a.job_id WHERE j.company_id = $1 \
                     GROUP BY a.status ORDER BY a.status",
                    id,
                ),
            ),
            widget("reviews", self.review_stats(id)),
            widget(
                "active_interns",
                self.count_for(
                    "SELECT COUNT(*) FROM intern_assignments x JOIN internships n ON n.id = x.internship_id \
                     WHERE n.company_id = $1 AND x.status = 'Assigned'",
                    id,
                ),
            ),
        );
        Ok(CompanyDashboard {
            company,
            jobs_by_status: jobs,
            applications_by_status: applications,
            reviews,
            active_interns: interns,
        })
    }

    async fn review_stats(&self, company_id: Uuid) -> Result<ReviewStats> {
        let pool = &self.pool;
        let stats = retry::read(|| async move {
            sqlx::query_as::<_, ReviewStats>(
                "SELECT COUNT(*) AS count, AVG(rating)::float8 AS average_rating \
                 FROM company_reviews WHERE company_id = $1",
            )
            .bind(company_id)
            .fetch_one(pool)
            .await
        })
        .await?;
        Ok(stats)
    }

    pub async fn job_summary(&self, id: Uuid) -> Result<JobSummary> {
        let job = self.jobs.get_by_id(id).await?;
        let (applications, interviews, skills) = tokio::join!(
            widget(
                "applications_by_status",
                self.counts_for(
                    "SELECT status AS label, COUNT(*) AS count FROM applications \
                     WHERE job_id = $1 GROUP BY status ORDER BY status",
                    id,
                ),
            ),
            widget("interviews", self.interview_stats("a.job_id", id)),
            widget("skills", self.jobs.list_skills(id)),
        );
        Ok(JobSummary {
            job,
            applications_by_status: applications,
            interviews,
            skills,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(label: &str, count: i64) -> LabelCount {
        LabelCount {
            label: label.to_string(),
            count,
        }
    }

    #[test]
    fn months_without_rows_are_zero_filled_in_order() {
        let keys: Vec<String> = ["2026-08", "2026-09", "2026-10"].iter().map(|s| s.to_string()).collect();
        let series = fill_months(&keys, &[row("2026-10", 4), row("2026-08", 1), row("2025-01", 9)]);
        let counts: Vec<(&str, i64)> = series.iter().map(|m| (m.month.as_str(), m.count)).collect();
        assert_eq!(counts, vec![("2026-08", 1), ("2026-09", 0), ("2026-10", 4)]);
    }

    #[test]
    fn ratio_is_undefined_without_demand() {
        assert_eq!(supply_ratio(0, 7), None);
        assert_eq!(supply_ratio(4, 2), Some(0.5));
        assert_eq!(supply_ratio(3, 1), Some(0.33));
    }

    #[tokio::test]
    async fn failed_widget_keeps_a_generic_message() {
        let failed: Widget<i64> = widget("skills", async {
            Err(crate::error::Error::Internal("relation missing".into()))
        })
        .await;
        assert_eq!(
            failed,
            Widget::Error {
                message: "Failed to load skills".into()
            }
        );
        let ok = widget("skills", async { Ok(3_i64) }).await;
        assert!(ok.is_ok());
    }
}
