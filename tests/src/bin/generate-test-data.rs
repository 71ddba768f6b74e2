use anyhow::Context;
use comtree_store::{
    api::{AccountType, Comment, Gender, Profile, UNKNOWN},
    snapshot, table, Node, NodeKey, Tree,
};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

const NUM_AUTHORS: usize = 12;
const NUM_TOP_COMMENTS: usize = 20;
const NUM_REPLIES: usize = 120;
const MAX_COMMENT_WORDS: usize = 25;
const MAX_LIKES: u64 = 5000;

const REGIONS: [&str; 5] = ["Beijing", "Sichuan", "Guangdong", "Zhejiang", ""];
const GENDERS: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Unknown];
const ACCOUNT_TYPES: [AccountType; 5] = [
    AccountType::Blue,
    AccountType::Red,
    AccountType::Yellow,
    AccountType::Personal,
    AccountType::Unknown,
];

fn gen_metric(rng: &mut StdRng, max: i64) -> i64 {
    // about one profile in five has a metric that was never collected
    match rng.gen_ratio(1, 5) {
        true => UNKNOWN,
        false => rng.gen_range(0..max),
    }
}

fn gen_profile(rng: &mut StdRng, i: usize) -> (String, Profile) {
    let link = format!("https://example.org/user/{i}");
    let mut profile = Profile::default();
    profile.set_all(
        lipsum::lipsum_title_with_rng(&mut *rng),
        link.clone(),
        format!("user{i}"),
        REGIONS.choose(rng).copied().unwrap_or_default().to_string(),
        gen_metric(rng, 100_000),
        gen_metric(rng, 1000),
        gen_metric(rng, 1_000_000),
        gen_metric(rng, 300),
        GENDERS.choose(rng).copied().unwrap_or_default(),
        gen_metric(rng, 80),
        lipsum::lipsum_words_with_rng(&mut *rng, 8),
        ACCOUNT_TYPES.choose(rng).copied().unwrap_or_default(),
        None,
    );
    (link, profile)
}

fn gen_comment(rng: &mut StdRng, authors: &[(String, Profile)]) -> Comment {
    let (link, profile) = authors[rng.gen_range(0..authors.len())].clone();
    let words = rng.gen_range(1..=MAX_COMMENT_WORDS);
    Comment::new(
        lipsum::lipsum_words_with_rng(&mut *rng, words),
        link,
        rng.gen_range(0..MAX_LIKES),
        profile,
        None,
    )
}

fn main() -> anyhow::Result<()> {
    let out = std::env::args()
        .nth(1)
        .context("usage: generate-test-data <output.json|output.csv>")?;
    let seed = match std::env::var("COMTREE_SEED") {
        Ok(s) => s.parse().context("parsing COMTREE_SEED as an integer")?,
        Err(_) => rand::random(),
    };
    eprintln!("generating with COMTREE_SEED={seed}");
    let mut rng = StdRng::seed_from_u64(seed);

    let authors = (0..NUM_AUTHORS)
        .map(|i| gen_profile(&mut rng, i))
        .collect::<Vec<_>>();

    let mut tree = Tree::new();
    let mut keys = Vec::<NodeKey>::new();
    for _ in 0..NUM_TOP_COMMENTS {
        let c = gen_comment(&mut rng, &authors);
        keys.push(tree.add_comment(c, None)?);
    }
    // replies pick any existing comment, so early comments grow deeper threads
    for _ in 0..NUM_REPLIES {
        let parent = keys[rng.gen_range(0..keys.len())];
        let c = gen_comment(&mut rng, &authors);
        keys.push(tree.add_node_under(parent, Node::new(c))?);
    }

    match out.ends_with(".csv") {
        true => table::save(&tree, &out),
        false => snapshot::save(&tree, &out),
    }
}
