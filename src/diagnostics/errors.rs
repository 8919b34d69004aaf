// Copyright (c) the Coral project contributors.

use crate::implement_diagnostic_functions;
use crate::utils::string_util::indefinite_article;

#[derive(Debug)]
pub enum Error {
    /// A constant name couldn't be resolved to a registered class.
    UninitializedConstant {
        /// The constant name that failed to resolve.
        identifier: String,
    },

    /// No method with the called name exists on the receiver's type.
    UndefinedMethod {
        /// The name of the method that was called.
        method: String,
        /// The rendered name of the receiver's type.
        receiver: String,
    },

    /// A name without a receiver matched neither a local variable nor a method.
    UndefinedLocalVariableOrMethod {
        /// The name that failed to resolve.
        name: String,
    },

    /// A class was re-opened with a superclass that differs from its registered one.
    SuperclassMismatch {
        /// The class being re-opened.
        class: String,
        /// The superclass named by the new declaration.
        declared: String,
        /// The superclass the class was registered with.
        registered: String,
    },

    /// A call supplied a number of arguments no overload of the method accepts.
    /// Also raised when a generic class is applied to the wrong number of type arguments.
    WrongNumberOfArguments,

    /// Used to indicate when two type kinds should match, but do not.
    TypeKindMismatch {
        /// The name of the expected kind.
        expected: String,
        /// The name of the found kind.
        actual: String,
    },
}

implement_diagnostic_functions!(
    Error,
    (
        "E001",
        UninitializedConstant,
        format!("uninitialized constant {identifier}"),
        identifier
    ),
    (
        "E002",
        UndefinedMethod,
        format!("undefined method '{method}' for {receiver}"),
        method,
        receiver
    ),
    (
        "E003",
        UndefinedLocalVariableOrMethod,
        format!("undefined local variable or method '{name}'"),
        name
    ),
    (
        "E004",
        SuperclassMismatch,
        format!("superclass mismatch for class {class} ({declared} for {registered})"),
        class,
        declared,
        registered
    ),
    (
        "E005",
        WrongNumberOfArguments,
        "wrong number of arguments"
    ),
    (
        "E006",
        TypeKindMismatch,
        format!(
            "type mismatch: expected {} '{expected}' but found {} '{actual}'",
            indefinite_article(expected),
            indefinite_article(actual),
        ),
        expected,
        actual
    )
);
