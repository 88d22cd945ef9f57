mod p4delta_tests;
