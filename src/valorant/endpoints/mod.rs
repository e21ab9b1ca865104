mod match_history;
mod mmr;
