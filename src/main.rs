fn main() {
    shardfall::game::run();
}
