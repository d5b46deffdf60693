//! Food classification and nutrition estimation.

pub mod agent;
pub mod tools;

pub use agent::NutritionAgent;
pub use tools::{FOOD_DATABASE, FoodEntry};
