use std::fs::File;
use std::io::{BufRead, BufReader};
use std::time::Instant;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use stategraph::config::READ_BUFFER_SIZE;
use stategraph::graph::defrag::FinishOptions;
use stategraph::graph::SparseGraph;
use stategraph::timer::SpinnerTimer;

#[derive(Parser, Debug, Serialize)]
#[command(author, version, about)]
struct Args {
    /// Base name of the data graph file (data/<dataset>.graph).
    #[arg(short, long, default_value_t = String::from("example"))]
    dataset: String,

    /// The task to be performed: tscc, reach or finish.
    #[arg(short, long, default_value_t = String::from("tscc"))]
    task: String,

    /// Source vertex id for reachability.
    #[arg(short, long, default_value_t = 0)]
    source_vertex: usize,

    /// Store the finished graph by target columns instead of source rows.
    #[arg(long, default_value_t = false)]
    store_by_columns: bool,

    /// Derive Tarjan stack membership instead of allocating a flag array.
    #[arg(long, default_value_t = false)]
    conserve_memory: bool,
}

/// Loads a graph file into a dynamic graph.
///
/// # Format
/// - First line: "? [vertex_count] [edge_count]"
/// - Edge lines: "e [source_id] [destination_id]"
/// - Vertex lines ("v ...") carry no adjacency information and are skipped.
///
/// # Panics
/// * If the file cannot be opened or read, or the format is incorrect.
fn load_graph_file(file_path: &str) -> SparseGraph<()> {
    let graph_file = File::open(file_path).unwrap();
    let mut graph_reader = BufReader::with_capacity(READ_BUFFER_SIZE, graph_file);
    let mut first_line = String::new();
    graph_reader.read_line(&mut first_line).unwrap();

    let first_line_tokens: Vec<&str> = first_line.split_whitespace().collect();
    assert_eq!(first_line_tokens.len(), 3);
    let vertex_count = first_line_tokens[1].parse::<usize>().unwrap();
    let edge_count = first_line_tokens[2].parse::<usize>().unwrap();

    let mut graph = SparseGraph::<()>::new(true, false);
    graph.add_nodes(vertex_count).unwrap();

    let pb = ProgressBar::new(edge_count as u64);
    pb.set_style(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        .unwrap()
        .progress_chars("=>-"));
    pb.set_message("Graph Loading.");

    for line in graph_reader.lines() {
        if let Ok(line) = line {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.is_empty() || tokens[0] != "e" {
                continue;
            }
            let src = tokens[1].parse::<usize>().ok().expect("File format error.");
            let dst = tokens[2].parse::<usize>().ok().expect("File format error.");
            graph.add_edge(src, dst, ()).unwrap();
            pb.inc(1);
        }
    }
    pb.finish_and_clear();
    graph
}

fn main() {
    let args: Args = Args::parse();
    let graph_name = args.dataset;
    let task = args.task;

    // Step 1: Load the graph file into dynamic mode.
    let mut graph = load_graph_file(&format!("data/{}.graph", graph_name));
    println!(
        "Loaded {}: {} vertices, {} edges, {} bytes.",
        graph_name,
        graph.num_nodes(),
        graph.num_edges(),
        graph.report_memory_bytes()
    );

    // Step 2: Freeze into CSR form; every task below runs on it.
    let timer = SpinnerTimer::new();
    graph
        .finish(FinishOptions {
            store_by_rows: !args.store_by_columns,
            timer: Some(&timer),
            ..Default::default()
        })
        .unwrap();

    // Step 3: Perform the task and report the time.
    if task == "tscc" {
        let mut sccmap = vec![0usize; graph.num_nodes()];
        let mut aux = vec![0usize; graph.num_nodes()];
        let start = Instant::now();

        let count = graph
            .compute_tsccs(Some(&timer), args.conserve_memory, &mut sccmap, &mut aux)
            .unwrap();

        let duration = start.elapsed();
        println!("Terminal SCC count: {}", count);
        println!("TSCC Elapsed Time: {:?} us", duration.as_micros());
    } else if task == "reach" {
        let mut reached = vec![false; graph.num_nodes()];
        let mut queue = Vec::new();
        let start = Instant::now();

        let count = graph
            .get_reachable(args.source_vertex, &mut reached, &mut queue)
            .unwrap();

        let duration = start.elapsed();
        println!("Reachable from {}: {} vertices.", args.source_vertex, count);
        println!("Reach Elapsed Time: {:?} us", duration.as_micros());
    } else if task == "finish" {
        let view = graph.export_finished().unwrap();
        println!(
            "Finished form: {} edges, transposed: {}, {} bytes.",
            view.column_index.len(),
            view.is_transposed,
            graph.report_memory_bytes()
        );
    } else {
        println!("Task {} not supported in stategraph.", task);
    }
}
