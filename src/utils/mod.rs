// Copyright (c) the Coral project contributors.

pub mod string_util;
