pub mod result_import;
