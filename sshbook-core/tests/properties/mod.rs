mod backup_tests;
mod filter_tests;
mod secret_tests;
mod ssh_config_tests;
