mod scenario_tests;
mod segment_pipeline_tests;
