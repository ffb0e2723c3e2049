mod fan_out_test;
