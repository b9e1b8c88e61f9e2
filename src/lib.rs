/*!
Model Description
=================

This model description follows the ODD (Overview, Design concept, Details)
protocol (Grimm et al., 2006; Grimm et al., 2010). As far as it is useful in
Rust source code, the model description is written as a literate program: the
sections of the protocol introduce the modules that implement them.

# 1. Purpose

The expansion model simulates the spread of a farming population across a
continent from a single centre of origin. Population grows in every settled
cell, and crowded cells send migrants to free neighbouring cells that offer a
suitable environment. When all neighbours are taken, migrants may leapfrog to
more distant cells. The output of the model is the year in which each cell was
first settled.

The particular research question is which combination of growth rate, carrying
capacity, dispersal rule and environmental constraints reproduces the
radiocarbon-dated arrival of the expansion at known archaeological sites. To
that end, a run ends by scoring the simulated arrival times against a list of
dated control points, and parameter sweeps compare the scores of many runs.

 */

/**

# 2. Entities, state variables, and scales

The model runs on a fixed raster in a projected, equal-area coordinate system,
in discrete time steps of one year. Years are counted either before present,
decreasing, or as calendar years, increasing. The year 0 never occurs in a run,
because an arrival time of 0 marks a cell that was never settled.

 */
pub type Years = i32;

/**
## 2.1 Study area

The study area is described by its raster geometry. Cells are addressed by
column and row, rows counting southwards from the northern edge. The geometry
maps between projected coordinates and cells.

 */
pub mod geometry;

/**
Each layer holds one value per cell. The environmental layers (elevation,
vegetation cover and, optionally, a habitat suitability score) are read from
Grid-ASCII rasters.

 */
pub mod ascii_grid;
pub mod layer;

/**
Vegetation and suitability change over the millennia covered by a run. They are
given as series of time slices, one raster per reconstructed year, and the grid
uses the slice nearest to the current year.

 */
pub mod snapshots;

/**
## 2.2 Cells

Apart from the environment, every cell has two state variables: its population
in whole persons, and its arrival time. The grid owns all layers and answers the
questions the demographic model asks of the environment.

 */
pub mod grid;

/**
The cells a crowded cell may send migrants to are its eight immediate
neighbours, and, when those are all unavailable, the cells at leap distance.

 */
pub mod neighborhood;

/**

# 3. Process overview and scheduling

Every time step has three phases, executed in this order:

 1. Growth of every settled cell
 2. Dispersal from crowded cells, in the order the cells were settled
 3. Refresh of the time-sliced environment, in years divisible by the refresh
    interval

after which the clock advances by one year. A run ends when the stop year has
been simulated, when more cells are settled than a saturation cap allows, or
when the step budget is exhausted.

 */
pub mod simulation;

/**

# 4. Design concepts

## 4.1 Basic principles

The model is a cellular automaton of demographic expansion in the tradition of
wave-of-advance models. Unlike a reaction-diffusion model, it moves whole
persons between discrete cells, so the front advances by at most one cell per
year unless people leapfrog.

## 4.2 Emergence

The speed and shape of the expansion front emerge from the interplay of growth
and the fission threshold with the environmental barriers.

## 4.3 Adaptation

Migrants choose between free neighbouring cells according to the dispersal rule:
they either split evenly, all go to one random cell, or all go to the cell with
the best habitat score.

 */
pub mod dispersal;

/**
## 4.4 Stochasticity

Only the dispersal rules `random_pick` and `best_suitability` draw random
numbers. All draws come from one seeded generator, so that runs with the same
seed and inputs are identical.

## 4.5 Observation

Progress is logged periodically. Occupancy snapshots of the grid can be written
as rasters to follow the expansion through time. At the end of a run, the
arrival times are written as a raster and compared with the dated control
points.

 */
pub mod observation;
pub mod scoring;

/**

# 5. Initialization

The origin cell receives a fraction of the carrying capacity as its founding
population, and its arrival time is the start year. All other cells are empty.
The environment is loaded for the start year.

 */
pub fn initialization(config: &config::Config) -> Result<simulation::Simulation, error::SetupError> {
    let p = &config.parameters;
    let grid = grid::Grid::load(
        &config.layers,
        p.habitat(),
        neighborhood::Neighborhood::new(p.leap_distance, p.leap_ring),
    )?;
    simulation::Simulation::initialize(p.clone(), grid)
}

/**

# 6. Input data

A run is configured by one JSON file, which names the model parameters, the
layer files, the outputs, and the control points. Some parameters can be
overridden from the command line, which is convenient for parameter sweeps.

 */
pub mod cli;
pub mod config;
pub mod error;

/**

# 7. Submodels

The growth, fission and dispersal submodels are parametrized as follows.

 */
pub mod parameters;

#[cfg(test)]
mod tests;
