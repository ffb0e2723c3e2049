mod restart_test;
mod snapshot_test;
