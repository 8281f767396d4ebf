//! Cross-module tests driven by the scripted fakes in `test_utils`

mod tx_assembly_tests;
