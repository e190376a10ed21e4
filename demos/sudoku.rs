//! Encodes a 9x9 Sudoku board as a resolution problem and solves it (§4.8).
//!
//! For every (row, col) there is a cell variable `row:col`, mandatory, with a
//! dependency on one of its nine candidate variables `row:col:num`. Every
//! candidate conflicts with the other candidates sharing its row, column, and
//! 3x3 box for the same digit. A partially filled board can be piped in on
//! stdin (`.` for a blank cell, one row per line); with no stdin it solves
//! the fully open board.

use resolvex::{
  ident::Identifier,
  problem::Problem,
  resolver::{Resolver, ResolverOptions},
  variable::Variable,
};
use std::io::Read;

const SIZE: usize = 9;
const BOX: usize = 3;

fn cell_id(row: usize, col: usize) -> String { format!("{}:{}", row, col) }

fn candidate_id(row: usize, col: usize, num: usize) -> String { format!("{}:{}:{}", row, col, num) }

fn box_of(row: usize, col: usize) -> (usize, usize) { (row / BOX, col / BOX) }

/// Builds the full Sudoku encoding, biasing `givens[row][col]` (1..=9, 0 for
/// blank) toward their given digit by only emitting the candidate variable
/// for that digit at a given cell.
fn build_problem(givens: &[[u8; SIZE]; SIZE]) -> Problem {
  let mut problem = Problem::new();

  for row in 0..SIZE {
    for col in 0..SIZE {
      let given = givens[row][col];
      let mut cell = Variable::new(cell_id(row, col), "cell");
      cell.add_mandatory("anchor").unwrap();
      let candidates: Vec<Identifier> = (0..SIZE)
        .filter(|&n| given == 0 || given as usize == n + 1)
        .map(|n| Identifier::from(candidate_id(row, col, n)))
        .collect();
      cell.add_dependency("has-a-digit", candidates).unwrap();
      problem.add_variable(cell);
    }
  }

  for row in 0..SIZE {
    for col in 0..SIZE {
      for num in 0..SIZE {
        let id = candidate_id(row, col, num);
        if problem.has_variable(&Identifier::from(id.as_str())) {
          continue;
        }
        problem.add_variable(Variable::new(id, "candidate"));
      }
    }
  }

  for row in 0..SIZE {
    for col in 0..SIZE {
      for num in 0..SIZE {
        let id = Identifier::from(candidate_id(row, col, num));
        let mut v = problem.variable(&id).unwrap().clone();

        for other_col in 0..SIZE {
          if other_col == col {
            continue;
          }
          v.add_conflict(
            format!("row-{}-{}-vs-{}", row, col, other_col),
            candidate_id(row, other_col, num),
          )
          .unwrap();
        }
        for other_row in 0..SIZE {
          if other_row == row {
            continue;
          }
          v.add_conflict(
            format!("col-{}-{}-vs-{}", col, row, other_row),
            candidate_id(other_row, col, num),
          )
          .unwrap();
        }
        let (box_row, box_col) = box_of(row, col);
        for r in box_row * BOX..box_row * BOX + BOX {
          for c in box_col * BOX..box_col * BOX + BOX {
            if (r, c) == (row, col) {
              continue;
            }
            v.add_conflict(format!("box-{}-{}-vs-{}-{}", row, col, r, c), candidate_id(r, c, num))
              .unwrap();
          }
        }

        problem.merge_variable(v).unwrap();
      }
    }
  }

  problem
}

/// Reads an optional board from stdin: nine lines of nine characters,
/// digits `1`-`9` or `.` for blank. Missing or short input is treated as a
/// fully open board.
fn read_givens() -> [[u8; SIZE]; SIZE] {
  let mut grid = [[0u8; SIZE]; SIZE];
  let mut input = String::new();
  if std::io::stdin().read_to_string(&mut input).is_err() {
    return grid;
  }
  for (row, line) in input.lines().take(SIZE).enumerate() {
    for (col, ch) in line.chars().take(SIZE).enumerate() {
      if let Some(digit) = ch.to_digit(10) {
        grid[row][col] = digit as u8;
      }
    }
  }
  grid
}

fn main() {
  tracing_subscriber::fmt::init();

  let givens = read_givens();
  let problem = build_problem(&givens);

  let solution = Resolver::new()
    .solve(&problem, &ResolverOptions::default())
    .expect("resolver error");

  if !solution.is_satisfiable() {
    eprintln!("no solution: {:?}", solution.not_satisfiable());
    std::process::exit(1);
  }

  for row in 0..SIZE {
    let mut line = String::new();
    for col in 0..SIZE {
      let mut found = '.';
      for num in 0..SIZE {
        let id = Identifier::from(candidate_id(row, col, num));
        if solution.is_selected(&id) {
          found = std::char::from_digit((num + 1) as u32, 10).unwrap();
          break;
        }
      }
      line.push(found);
    }
    println!("{}", line);
  }
}
