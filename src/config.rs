use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::Meal;

/// billing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// deposit billed at move-in when an intake does not set its own
    pub default_deposit: Money,
    pub meal_prices: MealPrices,
}

/// per-meal mess pricing used when marking attendance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPrices {
    pub breakfast: Money,
    pub lunch: Money,
    pub dinner: Money,
}

impl MealPrices {
    pub fn price_of(&self, meal: Meal) -> Money {
        match meal {
            Meal::Breakfast => self.breakfast,
            Meal::Lunch => self.lunch,
            Meal::Dinner => self.dinner,
        }
    }
}

impl Default for MealPrices {
    fn default() -> Self {
        MealPrices {
            breakfast: Money::ZERO,
            lunch: Money::ZERO,
            dinner: Money::ZERO,
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        BillingConfig {
            default_deposit: Money::ZERO,
            meal_prices: MealPrices::default(),
        }
    }
}

impl BillingConfig {
    /// configuration with flat meal pricing and a standard deposit
    pub fn with_rates(default_deposit: Money, breakfast: Money, lunch: Money, dinner: Money) -> Self {
        BillingConfig {
            default_deposit,
            meal_prices: MealPrices {
                breakfast,
                lunch,
                dinner,
            },
        }
    }
}
