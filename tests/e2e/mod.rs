// End-to-end integration tests for the chapter audio backend
//
// These tests use a shared testcontainers PostgreSQL instance with a database
// pool for test isolation. Each test receives its own isolated database from
// the pool, allowing tests to run in parallel without conflicts.
//
// Architecture:
// - One shared PostgreSQL container for the entire test suite
// - Database pool creates/manages isolated databases (chapter_audio_<uuid>)
// - Each test gets a unique database via test-context lifecycle hooks
// - Speech synthesis is stubbed; every other layer is the real one

mod test_audio_job_repository;
