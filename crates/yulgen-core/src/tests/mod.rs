/*! Unit tests for the type catalog, the statement buffer and hashing.
 *
 * Everything downstream derives value shapes and helper names from these pieces, so their
 * behavior is pinned here before any lowering happens.
 */

#![allow(unused_imports)]

mod hash_tests;
