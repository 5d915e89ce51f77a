use std::time::Duration;

use bigdecimal::BigDecimal;
use tokio::time::sleep;

#[derive(Debug, Clone)]
pub struct PlanConstraints {
    pub weekly_budget: BigDecimal,
    pub daily_calorie_target: i32,
    pub health_goals: Vec<String>,
    pub dietary_restrictions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedMeal {
    pub name: String,
    pub price: BigDecimal,
    pub calories: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MealPlanDay {
    pub day: String,
    pub breakfast: PlannedMeal,
    pub lunch: PlannedMeal,
    pub dinner: PlannedMeal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MealPlan {
    pub days: Vec<MealPlanDay>,
}

impl MealPlan {
    pub fn total_cost(&self) -> BigDecimal {
        self.days
            .iter()
            .map(|d| &d.breakfast.price + &d.lunch.price + &d.dinner.price)
            .sum()
    }

    pub fn total_calories(&self) -> i32 {
        self.days
            .iter()
            .map(|d| d.breakfast.calories + d.lunch.calories + d.dinner.calories)
            .sum()
    }
}

/// Seam for a real recommendation engine. The UI layer only depends on this
/// trait, so a personalized implementation can replace the stub without
/// touching callers.
#[tonic::async_trait]
pub trait MealPlanRecommender: Send + Sync {
    async fn generate(&self, constraints: &PlanConstraints) -> MealPlan;
}

/// Stub recommender: returns a fixed sample plan after a simulated processing
/// delay, ignoring the constraints. This mirrors what the product actually
/// ships today; it does not personalize anything.
pub struct StaticRecommender {
    latency: Duration,
}

impl StaticRecommender {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for StaticRecommender {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[tonic::async_trait]
impl MealPlanRecommender for StaticRecommender {
    async fn generate(&self, _constraints: &PlanConstraints) -> MealPlan {
        sleep(self.latency).await;
        sample_plan()
    }
}

fn meal(name: &str, price: u32, calories: i32) -> PlannedMeal {
    PlannedMeal {
        name: name.to_string(),
        price: BigDecimal::from(price),
        calories,
    }
}

pub fn sample_plan() -> MealPlan {
    MealPlan {
        days: vec![
            MealPlanDay {
                day: "Monday".to_string(),
                breakfast: meal("Idli Sambar", 35, 285),
                lunch: meal("Veg Fried Rice", 60, 380),
                dinner: meal("Paneer Butter Masala", 75, 450),
            },
            MealPlanDay {
                day: "Tuesday".to_string(),
                breakfast: meal("Masala Dosa", 45, 320),
                lunch: meal("Chicken Biryani", 85, 520),
                dinner: meal("Pav Bhaji", 50, 420),
            },
            MealPlanDay {
                day: "Wednesday".to_string(),
                breakfast: meal("Rava Uttapam", 40, 295),
                lunch: meal("Paneer Butter Masala", 75, 450),
                dinner: meal("Masala Dosa", 45, 320),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraints() -> PlanConstraints {
        PlanConstraints {
            weekly_budget: BigDecimal::from(1400),
            daily_calorie_target: 2000,
            health_goals: vec!["brain_power".to_string()],
            dietary_restrictions: vec![],
        }
    }

    #[tokio::test]
    async fn stub_returns_the_sample_plan() {
        let recommender = StaticRecommender::new(Duration::ZERO);
        let plan = recommender.generate(&constraints()).await;
        assert_eq!(plan, sample_plan());
        assert_eq!(plan.days.len(), 3);
    }

    #[test]
    fn sample_plan_totals() {
        let plan = sample_plan();
        assert_eq!(plan.total_cost(), BigDecimal::from(510));
        assert_eq!(plan.total_calories(), 3440);
    }
}
