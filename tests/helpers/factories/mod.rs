pub mod catalog_factory;
pub mod pivot_params_factory;
pub mod sales_row_factory;

pub use catalog_factory::CatalogFactory;
pub use pivot_params_factory::{PivotParamsFactory, STATUS_QUERY};
pub use sales_row_factory::SalesRowFactory;

#[cfg(test)]
mod catalog_factory_test;
#[cfg(test)]
mod pivot_params_factory_test;
#[cfg(test)]
mod sales_row_factory_test;
