//! Classic knowledge bases
//!
//! Small textbook problems used by the tests, the `demo` command and the
//! benchmarks. Each builder returns a fresh knowledge base with the
//! default procedure; callers pick another with `set_procedure`.
//!
//! # Panics
//!
//! The builders panic only if a built-in sentence fails to parse or tell,
//! which the tests of this module rule out.

use crate::store::KnowledgeBase;

/// Told sentences of the kings problem
pub const KINGS: &[&str] = &[
    "King(John)",
    "King(Richard)",
    "Greedy(John)",
    "FORALL x ((King(x) AND Greedy(x)) => Evil(x))",
];

/// "The law says that it is a crime for an American to sell weapons to
/// hostile nations..."
pub const WEAPONS: &[&str] = &[
    "FORALL x,y,z ((American(x) AND Weapon(y) AND Sells(x, y, z) AND Hostile(z)) => Criminal(x))",
    "Owns(Nono, M1)",
    "Missile(M1)",
    "FORALL x ((Missile(x) AND Owns(Nono, x)) => Sells(West, x, Nono))",
    "FORALL x (Missile(x) => Weapon(x))",
    "FORALL x (Enemy(x, America) => Hostile(x))",
    "American(West)",
    "Enemy(Nono, America)",
];

/// The weapons KB with the criminal rule stated over `Enemy` directly
pub const WEAPONS_ENEMY: &[&str] = &[
    "Missile(M1)",
    "Owns(Nono, M1)",
    "FORALL m ((Missile(m) AND Owns(Nono, m)) => Sells(West, m, Nono))",
    "FORALL x (Missile(x) => Weapon(x))",
    "Enemy(Nono, America)",
    "FORALL x,y,z ((American(x) AND Weapon(y) AND Sells(x, y, z) AND Enemy(z, America)) => Criminal(x))",
    "American(West)",
];

/// "Everyone who loves all animals is loved by someone..." Did Curiosity
/// kill the cat?
pub const LOVES_ANIMAL: &[&str] = &[
    "FORALL x (FORALL y (Animal(y) => Loves(x, y)) => EXISTS y Loves(y, x))",
    "FORALL x ((EXISTS z (Animal(z) AND Kills(x, z))) => (FORALL y NOT Loves(y, x)))",
    "FORALL x (Animal(x) => Loves(Jack, x))",
    "Kills(Jack, Tuna) OR Kills(Curiosity, Tuna)",
    "Cat(Tuna)",
    "FORALL x (Cat(x) => Animal(x))",
];

/// Reflexivity, symmetry and transitivity of `=`
pub const EQUALITY_AXIOMS: &[&str] = &[
    "FORALL x (x = x)",
    "FORALL x,y ((x = y) => (y = x))",
    "FORALL x,y,z ((x = y AND y = z) => x = z)",
];

const ABC: &[&str] = &["B = A", "B = C"];

const ABCD: &[&str] = &["A = B", "B = C", "C = D", "P(A)", "Q(F(A))"];

/// Substitution axioms for the predicates and functions of the ABCD problem
const ABCD_SUBSTITUTION: &[&str] = &[
    "FORALL x,y ((x = y AND P(x)) => P(y))",
    "FORALL x,y ((x = y AND Q(x)) => Q(y))",
    "FORALL x,y (x = y => F(x) = F(y))",
];

fn build(groups: &[&[&str]]) -> KnowledgeBase {
    let mut kb = KnowledgeBase::new();
    for text in groups.iter().flat_map(|g| g.iter()) {
        if let Err(e) = kb.tell_text(text) {
            panic!("built-in sentence {:?} rejected: {}", text, e);
        }
    }
    kb
}

pub fn kings_knowledge_base() -> KnowledgeBase {
    build(&[KINGS])
}

pub fn weapons_knowledge_base() -> KnowledgeBase {
    build(&[WEAPONS])
}

pub fn weapons_enemy_knowledge_base() -> KnowledgeBase {
    build(&[WEAPONS_ENEMY])
}

pub fn loves_animal_knowledge_base() -> KnowledgeBase {
    build(&[LOVES_ANIMAL])
}

/// `B = A` and `B = C`, optionally with the equality axioms
pub fn abc_equality_knowledge_base(include_axioms: bool) -> KnowledgeBase {
    if include_axioms {
        build(&[ABC, EQUALITY_AXIOMS])
    } else {
        build(&[ABC])
    }
}

/// A chain `A = B = C = D` with `P(A)` and `Q(F(A))`, optionally with the
/// equality and substitution axioms
pub fn abcd_equality_knowledge_base(include_axioms: bool) -> KnowledgeBase {
    if include_axioms {
        build(&[ABCD, EQUALITY_AXIOMS, ABCD_SUBSTITUTION])
    } else {
        build(&[ABCD])
    }
}
