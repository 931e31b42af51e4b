//! Numeric building blocks for the footylab analysis pipeline.
//!
//! This crate provides the small set of statistical tools the pipeline needs:
//!
//! - **Descriptive statistics**: min, max, mean, median, variance, standard deviation
//! - **Percentiles**: precomputed percentile points and percentile-of-score ranks
//! - **Regression**: ordinary least-squares line fitting for two variables
//!
//! All functions work on `f64` values and return `None` (or `NaN` where documented)
//! instead of panicking on empty input.
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`percentiles`]: Percentile computation and percentile ranks
//! - [`regression`]: Simple linear regression
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use footylab_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Ranking a value against a population
//!
//! ```
//! use footylab_stats::percentiles::percentile_of_score;
//!
//! let population = [1.0, 2.0, 3.0, 4.0];
//! assert_eq!(percentile_of_score(&population, 3.0), Some(75.0));
//! ```
//!
//! ## Fitting a line
//!
//! ```
//! use footylab_stats::regression::LinearFit;
//!
//! let fit = LinearFit::least_squares(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]).unwrap();
//! assert_eq!(fit.slope, 2.0);
//! assert_eq!(fit.intercept, 1.0);
//! ```

pub mod descriptive;
pub mod percentiles;
pub mod regression;
