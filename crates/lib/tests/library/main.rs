mod assembly_tests;
mod common;
mod synth_tests;
