//! Sluice Stages - loadable stage catalogs
//!
//! Each module builds one [`AddIn`] under a fixed name. A registry receives
//! the catalog once and loads or unloads add-ins by name afterwards.
//!
//! - `include_on_import`: `map`, `map_kargs`, `flatten`, `grab`, `drop_key`
//! - `built_in_functions`: collections, reductions and element conversions
//! - `custom_pipes`: `zip_internal`, `zip_to_dict`
//! - `itertools_pipes`: grouping, slicing and running totals
//! - `operator_pipes`: arithmetic and comparisons as map stages
//! - `testing_tools`: `limit_size`, `look_in`

pub mod built_in_functions;
pub mod custom_pipes;
pub mod include_on_import;
pub mod itertools_pipes;
pub mod operator_pipes;
mod support;
pub mod testing_tools;

#[cfg(test)]
mod testing;

use sluice_core::AddIn;

/// Every add-in of this crate.
pub fn catalog() -> Vec<AddIn> {
    vec![
        include_on_import::add_in(),
        built_in_functions::add_in(),
        custom_pipes::add_in(),
        itertools_pipes::add_in(),
        operator_pipes::add_in(),
        testing_tools::add_in(),
    ]
}

/// Looks an add-in up by name.
pub fn find(name: &str) -> Option<AddIn> {
    catalog().into_iter().find(|a| a.name == name)
}
