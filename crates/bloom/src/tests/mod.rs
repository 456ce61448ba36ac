mod codec_tests;
mod collision_tests;
