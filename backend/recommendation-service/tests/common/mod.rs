/// Test fixtures shared by the integration tests
use std::fs;
use tempfile::TempDir;

pub const GENRES: &str = "unknown|0\nAction|1\nComedy|2\nDrama|3\n\n";

pub const ITEMS: &str = "\
1|Toy Story (1995)|01-Jan-1995||http://us.imdb.com/M/title-exact?Toy%20Story%20(1995)|0|0|1|0
2|GoldenEye (1995)|01-Jan-1995||http://us.imdb.com/M/title-exact?GoldenEye%20(1995)|0|1|0|0
3|Four Rooms (1995)|01-Jan-1995||http://us.imdb.com/M/title-exact?Four%20Rooms%20(1995)|0|0|0|1
4|Get Shorty (1995)|01-Jan-1995||http://us.imdb.com/M/title-exact?Get%20Shorty%20(1995)|0|1|1|1
5|Copycat (1995)|01-Jan-1995||http://us.imdb.com/M/title-exact?Copycat%20(1995)|0|0|0|1
";

pub const USERS: &str = "\
1|24|M|technician|85711
2|53|F|other|94043
3|23|M|writer|32067
";

/// Eight valid ratings and one malformed line
pub const RATINGS: &str = "\
1\t1\t5\t874965758
1\t2\t3\t876893171
2\t1\t4\t888550871
2\t2\t5\t888551000
2\t3\t4\t888551100
garbage
3\t1\t5\t878542960
3\t4\t4\t878543541
3\t5\t2\t878543200
";

/// MovieLens-style directory with the fixture files above
pub fn movielens_fixture() -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    fs::write(dir.path().join("u.genre"), GENRES).expect("write u.genre");
    fs::write(dir.path().join("u.item"), ITEMS).expect("write u.item");
    fs::write(dir.path().join("u.user"), USERS).expect("write u.user");
    fs::write(dir.path().join("u.data"), RATINGS).expect("write u.data");
    dir
}
