pub mod catalog_refresher;
