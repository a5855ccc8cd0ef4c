mod backup_tests;
mod repository_tests;
mod scenario_tests;
