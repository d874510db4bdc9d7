use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Evaluation {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub student_id: Option<Uuid>,
    pub evaluator: String,
    pub technical_skills: i32,
    pub communication: i32,
    pub teamwork: i32,
    pub punctuality: i32,
    pub overall_rating: Decimal,
    pub comments: Option<String>,
    pub evaluated_on: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mean of the four criteria, rounded to two places.
pub fn overall_rating(technical: i32, communication: i32, teamwork: i32, punctuality: i32) -> Decimal {
    let sum = Decimal::from(technical + communication + teamwork + punctuality);
    (sum / Decimal::from(4)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn overall_rating_is_rounded_mean() {
        assert_eq!(overall_rating(5, 4, 4, 4), Decimal::from_str("4.25").unwrap());
        assert_eq!(overall_rating(1, 2, 2, 2), Decimal::from_str("1.75").unwrap());
        assert_eq!(overall_rating(3, 3, 3, 3), Decimal::from(3));
    }
}
