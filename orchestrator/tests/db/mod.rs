pub mod workflows_test;
